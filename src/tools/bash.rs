//! Bash tool - runs a shell command
//!
//! The child process is killed when the command times out or the loop is
//! canceled.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{Result, TandemError, ToolDefinition};
use crate::tools::args::{decode_args, ToolArgs};
use crate::tools::registry::Tool;
use crate::tools::truncate_output;

/// Arguments of the Bash tool
#[derive(Debug, Deserialize)]
pub struct BashArgs {
    /// Command line passed to `sh -c`
    pub command: String,
    /// Overrides the configured timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolArgs for BashArgs {
    fn from_bare(value: String) -> Option<Self> {
        Some(Self {
            command: value,
            timeout_secs: None,
        })
    }
}

/// Executes shell commands in the working directory
pub struct BashTool {
    timeout: Duration,
    max_output_bytes: usize,
}

impl BashTool {
    pub fn new(timeout_secs: u64, max_output_bytes: usize) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            max_output_bytes,
        }
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "Bash"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "Bash",
            "Run a shell command with sh -c in the current directory. Returns the exit code and combined stdout and stderr.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The command to run"
                    },
                    "timeout_secs": {
                        "type": "integer",
                        "description": "Timeout in seconds (optional)"
                    }
                },
                "required": ["command"]
            }),
        )
    }

    async fn call(&self, arguments: &str, cancel: &CancellationToken) -> Result<String> {
        let args: BashArgs = decode_args(self.name(), arguments)?;
        let timeout = args.timeout_secs.map(Duration::from_secs).unwrap_or(self.timeout);

        debug!(command = %args.command, timeout_secs = timeout.as_secs(), "running command");

        let child = Command::new("sh")
            .arg("-c")
            .arg(&args.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TandemError::tool(format!("Failed to spawn shell: {}", e)))?;

        // Dropping the output future kills the child
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(TandemError::Canceled),
            _ = tokio::time::sleep(timeout) => {
                return Err(TandemError::tool(format!(
                    "Command timed out after {}s",
                    timeout.as_secs()
                )))
            }
            output = child.wait_with_output() => output?,
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        Ok(format!(
            "{}\n[exit code: {}]",
            truncate_output(text.trim_end(), self.max_output_bytes),
            code
        ))
    }
}
