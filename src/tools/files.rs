//! File tools - read and write files on disk

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{Result, TandemError, ToolDefinition};
use crate::tools::args::{decode_args, ToolArgs};
use crate::tools::registry::Tool;
use crate::tools::truncate_output;

/// Lines returned when no limit is given
const DEFAULT_LINE_LIMIT: usize = 2000;

/// Arguments of the ReadFile tool
#[derive(Debug, Deserialize)]
pub struct ReadFileArgs {
    pub path: String,
    /// First line to return, 1-based
    #[serde(default)]
    pub offset: Option<usize>,
    /// Maximum number of lines
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ToolArgs for ReadFileArgs {
    fn from_bare(value: String) -> Option<Self> {
        Some(Self {
            path: value,
            offset: None,
            limit: None,
        })
    }
}

/// Reads a text file and returns numbered lines
pub struct ReadFileTool {
    max_output_bytes: usize,
}

impl ReadFileTool {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "ReadFile"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "ReadFile",
            "Read a text file. Returns numbered lines; use offset and limit for large files.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the file to read"
                    },
                    "offset": {
                        "type": "integer",
                        "description": "First line to read, starting at 1 (optional)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of lines to read (optional)"
                    }
                },
                "required": ["path"]
            }),
        )
    }

    async fn call(&self, arguments: &str, _cancel: &CancellationToken) -> Result<String> {
        let args: ReadFileArgs = decode_args(self.name(), arguments)?;
        debug!(path = %args.path, "reading file");

        let content = tokio::fs::read_to_string(&args.path)
            .await
            .map_err(|e| TandemError::tool(format!("Cannot read {}: {}", args.path, e)))?;

        let start = args.offset.unwrap_or(1).max(1);
        let limit = args.limit.unwrap_or(DEFAULT_LINE_LIMIT);

        let numbered: Vec<String> = content
            .lines()
            .enumerate()
            .skip(start - 1)
            .take(limit)
            .map(|(i, line)| format!("{:>6}\t{}", i + 1, line))
            .collect();

        if numbered.is_empty() {
            return Ok(format!("{} has no lines in the requested range", args.path));
        }

        Ok(truncate_output(&numbered.join("\n"), self.max_output_bytes))
    }
}

/// Arguments of the WriteFile tool
#[derive(Debug, Deserialize)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

impl ToolArgs for WriteFileArgs {}

/// Writes a file, creating parent directories
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "WriteFile"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "WriteFile",
            "Write content to a file, replacing it if it exists. Parent directories are created.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the file to write"
                    },
                    "content": {
                        "type": "string",
                        "description": "Full file content"
                    }
                },
                "required": ["path", "content"]
            }),
        )
    }

    async fn call(&self, arguments: &str, _cancel: &CancellationToken) -> Result<String> {
        let args: WriteFileArgs = decode_args(self.name(), arguments)?;
        debug!(path = %args.path, bytes = args.content.len(), "writing file");

        if let Some(parent) = Path::new(&args.path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&args.path, &args.content)
            .await
            .map_err(|e| TandemError::tool(format!("Cannot write {}: {}", args.path, e)))?;

        Ok(format!("Wrote {} bytes to {}", args.content.len(), args.path))
    }
}
