//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.
//! The set of tools is closed once the registry is built.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::config::ToolsConfig;
use crate::core::{Result, ToolDefinition};
use crate::tools::bash::BashTool;
use crate::tools::files::{ReadFileTool, WriteFileTool};
use crate::tools::ToolExecutor;

/// A single tool implementation
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by
    fn name(&self) -> &str;

    /// Declaration sent to the provider
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with raw JSON argument text
    async fn call(&self, arguments: &str, cancel: &CancellationToken) -> Result<String>;
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools in registration order
    tools: Vec<Box<dyn Tool>>,
    /// Position of each tool by name
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the tools enabled in config
    pub fn from_config(config: &ToolsConfig) -> Self {
        let mut registry = Self::new();

        for name in &config.enabled {
            match name.as_str() {
                "Bash" => registry.register(BashTool::new(
                    config.bash_timeout_secs,
                    config.max_output_bytes,
                )),
                "ReadFile" => registry.register(ReadFileTool::new(config.max_output_bytes)),
                "WriteFile" => registry.register(WriteFileTool),
                other => warn!(tool = other, "unknown tool in config, skipping"),
            }
        }

        registry
    }

    /// Register a tool; a tool with the same name is replaced
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = Box::new(tool),
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(Box::new(tool));
            }
        }
    }

    /// Names of the registered tools
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(
        &self,
        name: &str,
        arguments: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        match self.index.get(name) {
            Some(&i) => self.tools[i].call(arguments, cancel).await,
            None => Ok(format!("Tool '{}' is not implemented", name)),
        }
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}
