//! Agent orchestrator
//!
//! Main agent that coordinates the provider adapter and the tool executor.
//! Implements the tool-calling loop: infer, run requested tools, feed the
//! results back, and repeat until the model answers without tool calls.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agent::adapter::ProviderAdapter;
use crate::agent::conversation::Conversation;
use crate::agent::loop_state::{AgentLoopState, LoopPhase};
use crate::core::{Config, Result, TandemError, ToolCallResult, Turn};
use crate::llm::{create_provider, LLMProvider, ProviderSession};
use crate::tools::{ToolExecutor, ToolRegistry};

/// How a loop invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model produced a final answer
    Completed(String),
    /// The user canceled the loop
    Canceled,
}

/// Progress notifications for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// An inference call is starting
    Inferring { iteration: usize },
    /// A tool is about to run
    ToolStarted { id: String, name: String },
    /// A tool finished; `is_error` when its output is a rendered error
    ToolFinished {
        id: String,
        name: String,
        is_error: bool,
    },
    /// The loop produced its final answer
    Completed,
    /// The loop was canceled
    Canceled,
}

/// Main agent that orchestrates the LLM and tools
pub struct Agent {
    /// Configuration
    config: Config,
    /// Provider adapter owning the conversation
    adapter: ProviderAdapter,
    /// Tool executor
    tools: Arc<dyn ToolExecutor>,
    /// Optional progress channel
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl Agent {
    /// Create an agent from configuration, selecting the provider it names
    pub fn with_config(config: Config) -> Result<Self> {
        let backend = create_provider(&config)?;
        let tools: Arc<dyn ToolExecutor> = Arc::new(ToolRegistry::from_config(&config.tools));
        Ok(Self::from_parts(config, backend, tools))
    }

    /// Create an agent from explicit parts
    pub fn from_parts(
        config: Config,
        backend: Arc<dyn LLMProvider>,
        tools: Arc<dyn ToolExecutor>,
    ) -> Self {
        let mut conversation = Conversation::with_system_prompt(config.system_prompt.clone());
        let seeded = conversation.seed_rule_files(&config.rule_files);
        if seeded > 0 {
            info!(files = seeded, "loaded rule files");
        }

        let session = ProviderSession::from_config(config.provider, config.active_provider());
        let adapter = ProviderAdapter::new(backend, session, conversation, tools.definitions())
            .with_auto_summarize(config.agent.auto_summarize);

        Self {
            config,
            adapter,
            tools,
            events: None,
        }
    }

    /// Subscribe to progress events; replaces any previous subscriber
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<AgentEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone means nobody is watching
            let _ = tx.send(event);
        }
    }

    /// Process a prompt until the model stops requesting tools.
    ///
    /// An empty prompt continues from the current conversation. Provider
    /// errors end the cycle and are returned; cancellation is reported as
    /// [`LoopOutcome::Canceled`].
    pub async fn process(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<LoopOutcome> {
        self.adapter.repair_dangling_tool_uses();
        if !prompt.is_empty() {
            self.adapter.add_message(Turn::user(prompt))?;
        }

        let mut state = AgentLoopState::new();

        loop {
            if cancel.is_cancelled() {
                return self.finish_canceled(&mut state);
            }

            state.transition(LoopPhase::Inferring)?;
            self.emit(AgentEvent::Inferring {
                iteration: state.iterations,
            });

            let inference = match self.adapter.infer(cancel).await {
                Ok(inference) => inference,
                Err(TandemError::Canceled) => return self.finish_canceled(&mut state),
                Err(e) => return Err(e),
            };
            state.transition(LoopPhase::CheckToolCalls)?;

            if inference.tool_calls.is_empty() {
                if !inference.text.is_empty() {
                    self.adapter.add_message(Turn::assistant(&inference.text))?;
                }
                state.transition(LoopPhase::Done)?;
                info!(
                    iterations = state.iterations,
                    tool_calls = state.tool_calls,
                    "loop completed"
                );
                self.emit(AgentEvent::Completed);
                return Ok(LoopOutcome::Completed(inference.text));
            }

            state.transition(LoopPhase::ExecutingTools)?;

            for call in &inference.tool_calls {
                if cancel.is_cancelled() {
                    return self.finish_canceled(&mut state);
                }

                debug!(id = %call.id, tool = %call.name, "executing tool");
                self.emit(AgentEvent::ToolStarted {
                    id: call.id.clone(),
                    name: call.name.clone(),
                });

                let (output, is_error) =
                    match self.tools.execute(&call.name, &call.arguments, cancel).await {
                        Ok(output) => (output, false),
                        Err(e) => (format!("Error: {}", e), true),
                    };
                state.record_tool_call();

                self.adapter
                    .add_tool_result(ToolCallResult::new(call.id.clone(), output))?;
                self.emit(AgentEvent::ToolFinished {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    is_error,
                });
            }
        }
    }

    fn finish_canceled(&self, state: &mut AgentLoopState) -> Result<LoopOutcome> {
        state.transition(LoopPhase::Done)?;
        info!(iterations = state.iterations, "loop canceled");
        self.emit(AgentEvent::Canceled);
        Ok(LoopOutcome::Canceled)
    }

    /// Force a summarization pass
    pub async fn compact(&mut self, cancel: &CancellationToken) -> Result<bool> {
        self.adapter.summarize_now(cancel).await
    }

    /// Clear conversation history back to the seeded state
    pub fn clear_history(&mut self) {
        self.adapter.clear();
    }

    /// Total spend in USD
    pub fn calculate_price(&self) -> f64 {
        self.adapter.calculate_price()
    }

    /// Get the provider adapter
    pub fn adapter(&self) -> &ProviderAdapter {
        &self.adapter
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
