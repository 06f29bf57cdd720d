//! Custom error types for Tandem
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Tandem operations
#[derive(Error, Debug)]
pub enum TandemError {
    /// The provider refused the call because of rate limiting
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    /// Non-success response from a provider API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The summarization call returned nothing usable
    #[error("Summarization produced an empty summary")]
    EmptySummary,

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Conversation invariant violations
    #[error("Conversation error: {0}")]
    Conversation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was canceled by the user.
    ///
    /// Only used inside the crate; the agent loop reports it as
    /// [`LoopOutcome::Canceled`](crate::agent::LoopOutcome::Canceled).
    #[error("Operation canceled")]
    Canceled,

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Tandem operations
pub type Result<T> = std::result::Result<T, TandemError>;

impl TandemError {
    /// Create an API error
    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: msg.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a conversation error
    pub fn conversation(msg: impl Into<String>) -> Self {
        Self::Conversation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Whether this error signals rate limiting.
    ///
    /// Matches the dedicated variant, HTTP 429, and any provider message that
    /// mentions "rate limit" or "too many requests".
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Api { status: 429, .. } => true,
            Self::Api { message, .. } => mentions_rate_limit(message),
            Self::Other(message) => mentions_rate_limit(message),
            _ => false,
        }
    }

    /// Whether this is the cancellation signal
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Case-insensitive check for the rate-limit phrases providers use
pub fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("too many requests")
}
