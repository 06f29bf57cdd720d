//! Shared fakes for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tandem::core::{ProviderKind, Result, TandemError, ToolCallRequest, ToolDefinition, Turn};
use tandem::llm::{ChatRequest, LLMProvider, LLMResponse, TokenUsage};
use tandem::tools::ToolExecutor;
use tandem::Config;

/// One scripted provider reply
pub enum Step {
    Reply(Result<LLMResponse>),
    /// Never completes; only cancellation ends the call
    Hang,
}

/// What the provider was asked
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub turns: Vec<Turn>,
    pub tool_names: Vec<String>,
    pub temperature: Option<f32>,
}

/// LLM provider that replays a fixed script
#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replies(replies: Vec<Result<LLMResponse>>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Step::Reply).collect())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<LLMResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            turns: request.turns.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
            temperature: request.options.temperature,
        });

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Hang) => std::future::pending().await,
            None => Err(TandemError::Other("script exhausted".to_string())),
        }
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Tool executor with canned outputs
#[derive(Default)]
pub struct ScriptedTools {
    /// Tool name -> output; `Err` text becomes a tool error
    outputs: Vec<(String, std::result::Result<String, String>)>,
    /// Fired when any tool runs, to simulate Ctrl+C mid-execution
    cancel_on_execute: Option<CancellationToken>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, name: &str, output: &str) -> Self {
        self.outputs.push((name.to_string(), Ok(output.to_string())));
        self
    }

    pub fn failure(mut self, name: &str, message: &str) -> Self {
        self.outputs.push((name.to_string(), Err(message.to_string())));
        self
    }

    pub fn cancel_on_execute(mut self, token: CancellationToken) -> Self {
        self.cancel_on_execute = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for ScriptedTools {
    async fn execute(
        &self,
        name: &str,
        arguments: &str,
        _cancel: &CancellationToken,
    ) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.to_string()));

        if let Some(token) = &self.cancel_on_execute {
            token.cancel();
        }

        match self.outputs.iter().find(|(n, _)| n == name) {
            Some((_, Ok(output))) => Ok(output.clone()),
            Some((_, Err(message))) => Err(TandemError::tool(message.clone())),
            None => Ok(format!("Tool '{}' is not implemented", name)),
        }
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.outputs
            .iter()
            .map(|(name, _)| {
                ToolDefinition::new(
                    name.clone(),
                    format!("{} tool", name),
                    serde_json::json!({"type": "object", "properties": {}}),
                )
            })
            .collect()
    }
}

/// Config with no rule files and a fixed context window
pub fn test_config(context_window: u64) -> Config {
    let mut config = Config::default();
    config.provider = ProviderKind::Anthropic;
    config.system_prompt = "You are a test assistant.".to_string();
    config.rule_files = Vec::new();
    config.agent.auto_summarize = true;
    config.anthropic.model = "claude-sonnet-4-5".to_string();
    config.anthropic.context_window = Some(context_window);
    config
}

/// Text reply with usage
pub fn text(content: &str, input_tokens: u64) -> Result<LLMResponse> {
    Ok(LLMResponse {
        content: content.to_string(),
        usage: Some(TokenUsage::new(input_tokens, 10)),
        ..Default::default()
    })
}

/// Reply requesting tool calls given as (id, name, arguments)
pub fn tool_calls(content: &str, calls: &[(&str, &str, &str)]) -> Result<LLMResponse> {
    Ok(LLMResponse {
        content: content.to_string(),
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCallRequest::new(*id, *name, *args))
            .collect(),
        usage: Some(TokenUsage::new(100, 20)),
        ..Default::default()
    })
}

pub fn rate_limited() -> Result<LLMResponse> {
    Err(TandemError::RateLimited("rate limit exceeded".to_string()))
}

/// Every tool use in `turns` has a matching result somewhere after it
pub fn all_tool_uses_answered(turns: &[Turn]) -> bool {
    turns.iter().enumerate().all(|(i, turn)| {
        turn.tool_use_ids().iter().all(|id| {
            turns[i + 1..]
                .iter()
                .any(|later| later.tool_result_ids().contains(id))
        })
    })
}
