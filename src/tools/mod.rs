//! Tools module - Tool implementations for the agent
//!
//! Contains the tool execution contract the agent loop depends on, the tool
//! registry, and the built-in shell and file tools.

pub mod args;
pub mod bash;
pub mod files;
pub mod registry;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{Result, ToolDefinition};

pub use args::{decode_args, ToolArgs};
pub use registry::{Tool, ToolRegistry};

/// Executes tool calls requested by the model
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run tool `name` with raw JSON `arguments`.
    ///
    /// Unknown names yield a "not implemented" message rather than an error.
    async fn execute(
        &self,
        name: &str,
        arguments: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// Declarations of every available tool
    fn definitions(&self) -> Vec<ToolDefinition>;
}

/// Cut `text` to at most `max_bytes` on a char boundary, noting the cut
pub fn truncate_output(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... [output truncated, {} of {} bytes shown]",
        &text[..end],
        end,
        text.len()
    )
}
