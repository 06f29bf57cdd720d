//! Agent module - orchestration and conversation management
//!
//! Contains the agent loop, the provider adapter that owns the conversation,
//! and the summarizer that keeps it inside the context window.

pub mod adapter;
pub mod conversation;
pub mod loop_state;
pub mod orchestrator;
pub mod summarizer;

pub use adapter::{InferenceResult, ProviderAdapter};
pub use conversation::Conversation;
pub use loop_state::{AgentLoopState, LoopPhase};
pub use orchestrator::{Agent, AgentEvent, LoopOutcome};
