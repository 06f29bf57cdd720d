//! Provider adapter
//!
//! Owns the conversation and the provider session, issues inference calls
//! through the selected backend, and handles context budgeting and the
//! single rate-limit retry.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent::conversation::{Conversation, CANCELED_TOOL_RESULT};
use crate::agent::summarizer::{self, should_summarize};
use crate::core::{Result, TandemError, ToolCallRequest, ToolCallResult, ToolDefinition, Turn};
use crate::llm::{ChatRequest, GenerateOptions, LLMProvider, ProviderSession};

/// Outcome of one inference call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceResult {
    /// Text produced by the model
    pub text: String,
    /// Tool calls requested by the model, in provider order
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Drives inference against one backend for one conversation
pub struct ProviderAdapter {
    backend: Arc<dyn LLMProvider>,
    session: ProviderSession,
    conversation: Conversation,
    tools: Vec<ToolDefinition>,
    options: GenerateOptions,
    auto_summarize: bool,
}

impl ProviderAdapter {
    /// Create an adapter; tool declarations are fixed for its lifetime
    pub fn new(
        backend: Arc<dyn LLMProvider>,
        session: ProviderSession,
        conversation: Conversation,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            backend,
            session,
            conversation,
            tools,
            options: GenerateOptions::default(),
            auto_summarize: true,
        }
    }

    /// Enable or disable summarization at the start of each call
    pub fn with_auto_summarize(mut self, enabled: bool) -> Self {
        self.auto_summarize = enabled;
        self
    }

    /// Set sampling options for regular calls
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one inference call over the current conversation.
    ///
    /// When the reply requests tools, the assistant turn carrying the tool
    /// uses is appended before returning. Rate limiting triggers one forced
    /// summarization and one retry; a second rate limit is terminal.
    pub async fn infer(&mut self, cancel: &CancellationToken) -> Result<InferenceResult> {
        if self.auto_summarize && should_summarize(&self.session) {
            debug!(
                input_tokens = self.session.input_tokens,
                context_window = self.session.context_window,
                "context budget exceeded"
            );
            self.summarize_or_warn(cancel).await?;
        }

        let mut retried = false;
        let response = loop {
            // Rebuilt every attempt so a retry sees the summarized conversation
            let request = ChatRequest {
                turns: self.conversation.turns(),
                tools: &self.tools,
                options: &self.options,
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TandemError::Canceled),
                result = self.backend.chat(request) => result,
            };

            match result {
                Ok(response) => break response,
                Err(e) if e.is_rate_limited() && !retried => {
                    warn!(error = %e, "rate limited, summarizing before one retry");
                    retried = true;
                    self.summarize_or_warn(cancel).await?;
                }
                Err(e @ TandemError::RateLimited(_)) => return Err(e),
                Err(e) if e.is_rate_limited() => {
                    return Err(TandemError::RateLimited(e.to_string()))
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(usage) = response.usage {
            self.session.record(usage);
        }

        let mut tool_calls = response.tool_calls;
        if !tool_calls.is_empty() {
            dedupe_tool_call_ids(&mut tool_calls);
            self.conversation
                .add_assistant_tool_uses(&response.content, &tool_calls);
        }

        Ok(InferenceResult {
            text: response.content,
            tool_calls,
        })
    }

    /// Summarize; failures other than cancellation are only logged
    async fn summarize_or_warn(&mut self, cancel: &CancellationToken) -> Result<()> {
        match self.summarize_now(cancel).await {
            Ok(_) => Ok(()),
            Err(TandemError::Canceled) => Err(TandemError::Canceled),
            Err(e) => {
                warn!(error = %e, "summarization failed, continuing uncompacted");
                Ok(())
            }
        }
    }

    /// Force a summarization pass; returns whether anything was compacted
    pub async fn summarize_now(&mut self, cancel: &CancellationToken) -> Result<bool> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TandemError::Canceled),
            result = summarizer::summarize(
                self.backend.as_ref(),
                &mut self.conversation,
                &mut self.session,
            ) => result,
        }
    }

    /// Append a turn to the conversation
    pub fn add_message(&mut self, turn: Turn) -> Result<()> {
        self.conversation.add_turn(turn)
    }

    /// Append a tool result; the call must be pending
    pub fn add_tool_result(&mut self, result: ToolCallResult) -> Result<()> {
        self.conversation
            .add_tool_result(&result.call_id, result.output)
    }

    /// Answer tool uses left open by a canceled cycle; returns how many
    pub fn repair_dangling_tool_uses(&mut self) -> usize {
        let closed = self
            .conversation
            .close_dangling_tool_uses(CANCELED_TOOL_RESULT);
        if closed > 0 {
            debug!(closed, "closed dangling tool uses");
        }
        closed
    }

    /// Total spend in USD
    pub fn calculate_price(&self) -> f64 {
        self.session.calculate_price()
    }

    /// Reset the conversation to its seeded state
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.session.reset_context_counters();
    }

    pub fn session(&self) -> &ProviderSession {
        &self.session
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn backend(&self) -> &dyn LLMProvider {
        self.backend.as_ref()
    }
}

/// Rewrite empty or repeated tool call ids to `call_{index}` so each call
/// can be paired with exactly one result.
fn dedupe_tool_call_ids(calls: &mut [ToolCallRequest]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(calls.len());
    for index in 0..calls.len() {
        let id = &calls[index].id;
        if !id.is_empty() && !seen.contains(id) {
            seen.insert(id.clone());
            continue;
        }

        let mut fresh = format!("call_{}", index);
        let mut suffix = 1;
        while seen.contains(&fresh) || calls.iter().any(|c| c.id == fresh) {
            fresh = format!("call_{}_{}", index, suffix);
            suffix += 1;
        }
        debug!(original = %calls[index].id, id = %fresh, "rewrote tool call id");
        calls[index].id = fresh.clone();
        seen.insert(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(calls: &[ToolCallRequest]) -> Vec<&str> {
        calls.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_unique_ids_are_kept() {
        let mut calls = vec![
            ToolCallRequest::new("a", "Bash", "{}"),
            ToolCallRequest::new("b", "Bash", "{}"),
        ];
        dedupe_tool_call_ids(&mut calls);
        assert_eq!(ids(&calls), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_and_repeated_ids_are_rewritten() {
        let mut calls = vec![
            ToolCallRequest::new("", "Bash", "{}"),
            ToolCallRequest::new("x", "Bash", "{}"),
            ToolCallRequest::new("x", "ReadFile", "{}"),
            ToolCallRequest::new("", "Bash", "{}"),
        ];
        dedupe_tool_call_ids(&mut calls);
        assert_eq!(ids(&calls), vec!["call_0", "x", "call_2", "call_3"]);
    }

    #[test]
    fn test_rewrite_avoids_existing_ids() {
        let mut calls = vec![
            ToolCallRequest::new("call_1", "Bash", "{}"),
            ToolCallRequest::new("call_1", "Bash", "{}"),
        ];
        dedupe_tool_call_ids(&mut calls);
        assert_eq!(ids(&calls), vec!["call_1", "call_1_1"]);
    }
}
