//! Tandem - command-line AI assistant
//!
//! Drives a tool-calling loop against either the Anthropic Messages API or the
//! OpenAI Chat Completions API through one unified conversation model.
//!
//! # Architecture
//!
//! - **Core**: Unified content model, configuration, logging, and error handling
//! - **LLM**: Provider abstraction with Anthropic and OpenAI backends, token accounting
//! - **Agent**: Tool-calling loop, provider adapter, conversation, and summarization
//! - **Tools**: Tool execution contract, registry, shell and file tools
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use tandem::{Agent, Config, LoopOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> tandem::Result<()> {
//!     let mut agent = Agent::with_config(Config::load())?;
//!     let cancel = CancellationToken::new();
//!
//!     if let LoopOutcome::Completed(answer) = agent.process("List the files here", &cancel).await? {
//!         println!("{}", answer);
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use crate::agent::{Agent, AgentEvent, LoopOutcome};
pub use crate::cli::{CancelOnCtrlC, Repl};
pub use crate::core::{Config, ProviderKind, Result, TandemError};
