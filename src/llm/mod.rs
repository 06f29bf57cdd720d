//! LLM module - Language Model integrations
//!
//! Provides one abstraction over the Anthropic and OpenAI chat APIs, plus the
//! per-session token and cost accounting.

pub mod models;
pub mod provider;
pub mod session;
pub mod traits;

pub use models::*;
pub use provider::create_provider;
pub use session::ProviderSession;
pub use traits::{ChatRequest, GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
