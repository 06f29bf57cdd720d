//! Anthropic Messages API provider
//!
//! The leading system turn is lifted into the top-level `system` field, tool
//! calls travel as `tool_use` blocks, and tool results as `tool_result` blocks
//! inside a user message.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::config::ProviderConfig;
use crate::core::{
    Content, ContentBlock, Result, Role, TandemError, ToolCallRequest, ToolDefinition, Turn,
};
use crate::llm::traits::{ChatRequest, LLMProvider, LLMResponse, TokenUsage};

/// The Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

/// Messages API request body
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A message in Anthropic's format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AnthropicMessage {
    /// "user" or "assistant"
    role: String,
    content: AnthropicContent,
}

/// Message content: a bare string or an array of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicBlock>),
}

/// A content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block types this client does not use (thinking, images, ...)
    #[serde(other)]
    Unsupported,
}

/// Tool declaration
#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

/// Messages API response body
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<AnthropicBlock>,
    #[serde(default)]
    model: String,
    usage: AnthropicUsage,
}

/// Token usage
#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
    #[serde(default)]
    cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    cache_read_input_tokens: Option<u64>,
}

/// Error envelope
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl AnthropicProvider {
    /// Create a new client from provider configuration
    pub fn from_config(config: &ProviderConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// Convert unified turns to Anthropic messages, extracting the system prompt
pub(crate) fn encode_turns(turns: &[Turn]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system = None;
    let mut messages = Vec::with_capacity(turns.len());

    for (i, turn) in turns.iter().enumerate() {
        if turn.role == Role::System && i == 0 {
            system = Some(turn.text());
            continue;
        }

        let role = match turn.role {
            Role::Assistant => "assistant",
            // Tool results ride in user messages
            Role::User | Role::Tool | Role::System => "user",
        };

        let content = match &turn.content {
            Content::Plain(text) => AnthropicContent::Text(text.clone()),
            Content::Blocks(blocks) => {
                AnthropicContent::Blocks(blocks.iter().map(encode_block).collect())
            }
        };

        messages.push(AnthropicMessage {
            role: role.to_string(),
            content,
        });
    }

    (system, messages)
}

fn encode_block(block: &ContentBlock) -> AnthropicBlock {
    match block {
        ContentBlock::Text { text } => AnthropicBlock::Text { text: text.clone() },
        ContentBlock::ToolUse {
            id,
            name,
            arguments,
        } => AnthropicBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: tool_input(id, arguments),
        },
        ContentBlock::ToolResult { tool_use_id, text } => AnthropicBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: text.clone(),
        },
    }
}

/// `tool_use.input` must be an object; anything else is kept under `_raw`
fn tool_input(id: &str, arguments: &str) -> serde_json::Value {
    if arguments.trim().is_empty() {
        return serde_json::json!({});
    }
    match serde_json::from_str::<serde_json::Value>(arguments) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => {
            debug!(id, "tool arguments are not a JSON object, wrapping raw text");
            serde_json::json!({ "_raw": arguments })
        }
    }
}

/// Convert Anthropic messages back into unified turns
pub(crate) fn decode_messages(system: Option<String>, messages: Vec<AnthropicMessage>) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(messages.len() + 1);

    if let Some(system) = system {
        turns.push(Turn::system(system));
    }

    for message in messages {
        let assistant = message.role == "assistant";
        let turn = match message.content {
            AnthropicContent::Text(text) => {
                let role = if assistant { Role::Assistant } else { Role::User };
                Turn::plain(role, text)
            }
            AnthropicContent::Blocks(blocks) => {
                let blocks: Vec<ContentBlock> =
                    blocks.into_iter().filter_map(decode_block).collect();
                let only_results = !blocks.is_empty()
                    && blocks
                        .iter()
                        .all(|b| matches!(b, ContentBlock::ToolResult { .. }));
                let role = if assistant {
                    Role::Assistant
                } else if only_results {
                    Role::Tool
                } else {
                    Role::User
                };
                Turn::blocks(role, blocks)
            }
        };
        turns.push(turn);
    }

    turns
}

fn decode_block(block: AnthropicBlock) -> Option<ContentBlock> {
    match block {
        AnthropicBlock::Text { text } => Some(ContentBlock::Text { text }),
        AnthropicBlock::ToolUse { id, name, input } => Some(ContentBlock::ToolUse {
            id,
            name,
            arguments: input.to_string(),
        }),
        AnthropicBlock::ToolResult {
            tool_use_id,
            content,
        } => Some(ContentBlock::ToolResult {
            tool_use_id,
            text: content,
        }),
        AnthropicBlock::Unsupported => None,
    }
}

/// Convert an API response into the unified response
fn parse_response(response: MessagesResponse) -> LLMResponse {
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            AnthropicBlock::Text { text } => texts.push(text),
            AnthropicBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCallRequest::new(id, name, input.to_string()));
            }
            AnthropicBlock::ToolResult { .. } | AnthropicBlock::Unsupported => {}
        }
    }

    let usage = &response.usage;
    let input_tokens = usage.input_tokens
        + usage.cache_creation_input_tokens.unwrap_or(0)
        + usage.cache_read_input_tokens.unwrap_or(0);

    LLMResponse {
        content: texts.join("\n"),
        tool_calls,
        usage: Some(TokenUsage::new(input_tokens, usage.output_tokens)),
        model: response.model,
    }
}

/// Map a non-success response to an error
fn classify_error(status: u16, body: &str) -> TandemError {
    let (kind, message) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) => (e.error.kind, e.error.message),
        Err(_) => (String::new(), body.to_string()),
    };

    if status == 429 || kind == "rate_limit_error" {
        return TandemError::RateLimited(message);
    }

    if kind.is_empty() {
        TandemError::api(status, message)
    } else {
        TandemError::api(status, format!("{}: {}", kind, message))
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<LLMResponse> {
        let (system, messages) = encode_turns(request.turns);

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t: &ToolDefinition| AnthropicTool {
                        name: &t.name,
                        description: &t.description,
                        input_schema: &t.parameters,
                    })
                    .collect(),
            )
        };

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.options.max_tokens.unwrap_or(self.max_tokens),
            messages,
            system,
            tools,
            temperature: request.options.temperature,
        };

        debug!(
            provider = "anthropic",
            messages = body.messages.len(),
            tools = request.tools.len(),
            "sending request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| TandemError::malformed(format!("Anthropic response: {}", e)))?;

        let response = parse_response(parsed);
        debug!(
            provider = "anthropic",
            tool_calls = response.tool_calls.len(),
            "received response"
        );
        Ok(response)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
