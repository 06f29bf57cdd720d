//! LLM Provider trait for abstracting the remote wire protocols
//!
//! Each implementation translates the unified [`Turn`] model into its native
//! schema, performs one HTTP round trip, and parses the reply back.

use async_trait::async_trait;

use crate::core::{Result, ToolCallRequest, ToolDefinition, Turn};

/// Response from an LLM provider
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Any tool calls the model wants to make, in provider order
    pub tool_calls: Vec<ToolCallRequest>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

impl LLMResponse {
    /// A plain text response, mostly useful for tests and fakes
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Check if response contains tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

/// Options for LLM generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling
    pub temperature: Option<f32>,
    /// Maximum tokens to generate; providers fall back to their config
    pub max_tokens: Option<u32>,
}

/// One inference request in the unified model
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// Conversation turns; a leading system turn carries the instructions
    pub turns: &'a [Turn],
    /// Tool declarations offered to the model
    pub tools: &'a [ToolDefinition],
    /// Sampling options
    pub options: &'a GenerateOptions,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Perform one inference call.
    ///
    /// Rate limiting must surface as an error for which
    /// [`TandemError::is_rate_limited`](crate::core::TandemError::is_rate_limited)
    /// holds; other remote errors are returned verbatim.
    async fn chat(&self, request: ChatRequest<'_>) -> Result<LLMResponse>;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    /// Get the provider name
    fn name(&self) -> &str;
}
