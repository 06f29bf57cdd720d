//! OpenAI Chat Completions provider
//!
//! Also works against OpenAI-compatible servers that accept the same schema
//! under `{base_url}/chat/completions`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::config::ProviderConfig;
use crate::core::{Content, ContentBlock, Result, Role, TandemError, ToolCallRequest, Turn};
use crate::llm::traits::{ChatRequest, LLMProvider, LLMResponse, TokenUsage};

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A message in OpenAI's format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OpenAIMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<OpenAIContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Message content: a bare string or an array of text parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIPart>),
}

impl OpenAIContent {
    fn text(&self) -> String {
        match self {
            OpenAIContent::Text(text) => text.clone(),
            OpenAIContent::Parts(parts) => parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAIPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl OpenAIPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAIFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    /// JSON text, passed through untouched
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAIFunctionDef<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl OpenAIProvider {
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
        format!("{}/chat/completions", self.base_url)
    }
}

/// Reasoning models take `max_completion_tokens` and reject custom temperature
fn is_reasoning_model(model: &str) -> bool {
    let mut chars = model.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('o'), Some(c)) if c.is_ascii_digit()
    ) || model.starts_with("gpt-5")
}

/// Convert unified turns to OpenAI messages
pub(crate) fn encode_turns(turns: &[Turn]) -> Vec<OpenAIMessage> {
    let mut messages = Vec::with_capacity(turns.len());

    for turn in turns {
        let role = match turn.role {
            Role::System => "system",
            Role::User | Role::Tool => "user",
            Role::Assistant => "assistant",
        };

        let blocks = match &turn.content {
            Content::Plain(text) => {
                messages.push(message(role, Some(OpenAIContent::Text(text.clone()))));
                continue;
            }
            Content::Blocks(blocks) => blocks,
        };

        let mut parts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block {
                ContentBlock::Text { text } => parts.push(OpenAIPart::text(text.clone())),
                ContentBlock::ToolUse {
                    id,
                    name,
                    arguments,
                } => tool_calls.push(OpenAIToolCall {
                    id: id.clone(),
                    kind: function_kind(),
                    function: OpenAIFunctionCall {
                        name: name.clone(),
                        arguments: arguments.clone(),
                    },
                }),
                // One `tool` message per result
                ContentBlock::ToolResult { tool_use_id, text } => messages.push(OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(OpenAIContent::Text(text.clone())),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                }),
            }
        }

        if !tool_calls.is_empty() {
            let text = parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            messages.push(OpenAIMessage {
                role: "assistant".to_string(),
                content: (!text.is_empty()).then_some(OpenAIContent::Text(text)),
                tool_calls: Some(tool_calls),
                tool_call_id: None,
            });
        } else if !parts.is_empty() {
            messages.push(message(role, Some(OpenAIContent::Parts(parts))));
        }
    }

    messages
}

fn message(role: &str, content: Option<OpenAIContent>) -> OpenAIMessage {
    OpenAIMessage {
        role: role.to_string(),
        content,
        tool_calls: None,
        tool_call_id: None,
    }
}

fn decode_content(content: Option<OpenAIContent>) -> Content {
    match content {
        None => Content::Plain(String::new()),
        Some(OpenAIContent::Text(text)) => Content::Plain(text),
        Some(OpenAIContent::Parts(parts)) => Content::Blocks(
            parts
                .into_iter()
                .map(|p| ContentBlock::Text { text: p.text })
                .collect(),
        ),
    }
}

/// Convert OpenAI messages back into unified turns.
///
/// Consecutive `tool` messages fold into a single tool turn.
pub(crate) fn decode_messages(messages: Vec<OpenAIMessage>) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role.as_str() {
            "tool" => {
                let block = ContentBlock::tool_result(
                    msg.tool_call_id.unwrap_or_default(),
                    msg.content.map(|c| c.text()).unwrap_or_default(),
                );
                match turns.last_mut() {
                    Some(Turn {
                        role: Role::Tool,
                        content: Content::Blocks(blocks),
                    }) => blocks.push(block),
                    _ => turns.push(Turn::blocks(Role::Tool, vec![block])),
                }
            }
            "assistant" => match msg.tool_calls {
                Some(calls) if !calls.is_empty() => {
                    let mut blocks = Vec::with_capacity(calls.len() + 1);
                    let text = msg.content.map(|c| c.text()).unwrap_or_default();
                    if !text.is_empty() {
                        blocks.push(ContentBlock::text(text));
                    }
                    blocks.extend(calls.into_iter().map(|c| ContentBlock::ToolUse {
                        id: c.id,
                        name: c.function.name,
                        arguments: c.function.arguments,
                    }));
                    turns.push(Turn::blocks(Role::Assistant, blocks));
                }
                _ => turns.push(Turn {
                    role: Role::Assistant,
                    content: decode_content(msg.content),
                }),
            },
            role => {
                let role = if role == "system" || role == "developer" {
                    Role::System
                } else {
                    Role::User
                };
                turns.push(Turn {
                    role,
                    content: decode_content(msg.content),
                });
            }
        }
    }

    turns
}

/// Convert an API response into the unified response
fn parse_response(response: CompletionResponse) -> Result<LLMResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TandemError::malformed("OpenAI response contained no choices"))?;

    let message = choice.message;
    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| ToolCallRequest::new(c.id, c.function.name, c.function.arguments))
        .collect();

    Ok(LLMResponse {
        content: message.content.map(|c| c.text()).unwrap_or_default(),
        tool_calls,
        usage: response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        model: response.model,
    })
}

/// Map a non-success response to an error
fn classify_error(status: u16, body: &str) -> TandemError {
    let (code, message) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) => (e.error.code.unwrap_or_default(), e.error.message),
        Err(_) => (String::new(), body.to_string()),
    };

    if status == 429 || code == "rate_limit_exceeded" {
        TandemError::RateLimited(message)
    } else {
        TandemError::api(status, message)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<LLMResponse> {
        let messages = encode_turns(request.turns);

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OpenAITool {
                        kind: "function",
                        function: OpenAIFunctionDef {
                            name: &t.name,
                            description: &t.description,
                            parameters: &t.parameters,
                        },
                    })
                    .collect(),
            )
        };

        let max_tokens = request.options.max_tokens.unwrap_or(self.max_tokens);
        let reasoning = is_reasoning_model(&self.model);

        let body = CompletionRequest {
            model: &self.model,
            messages,
            tools,
            max_tokens: (!reasoning).then_some(max_tokens),
            max_completion_tokens: reasoning.then_some(max_tokens),
            temperature: if reasoning {
                None
            } else {
                request.options.temperature
            },
        };

        debug!(
            provider = "openai",
            messages = body.messages.len(),
            tools = request.tools.len(),
            "sending request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| TandemError::malformed(format!("OpenAI response: {}", e)))?;

        let response = parse_response(parsed)?;
        debug!(
            provider = "openai",
            tool_calls = response.tool_calls.len(),
            "received response"
        );
        Ok(response)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_only_round_trip() {
        let turns = vec![
            Turn::system("be terse"),
            Turn::user("rule file contents"),
            Turn::user("hello"),
            Turn::assistant("hi there"),
            Turn::blocks(
                Role::User,
                vec![ContentBlock::text("one"), ContentBlock::text("two")],
            ),
            Turn::blocks(Role::Assistant, vec![ContentBlock::text("answer")]),
        ];
        let json = serde_json::to_string(&encode_turns(&turns)).unwrap();
        let parsed: Vec<OpenAIMessage> = serde_json::from_str(&json).unwrap();
        assert_eq!(decode_messages(parsed), turns);
    }

    #[test]
    fn test_tool_results_become_separate_messages() {
        let turns = vec![
            Turn::user("go"),
            Turn::blocks(
                Role::Assistant,
                vec![
                    ContentBlock::from(&ToolCallRequest::new("call_1", "Bash", r#"{"command":"ls"}"#)),
                    ContentBlock::from(&ToolCallRequest::new("call_2", "ReadFile", r#"{"path":"x"}"#)),
                ],
            ),
            Turn::blocks(
                Role::Tool,
                vec![
                    ContentBlock::tool_result("call_1", "a\nb"),
                    ContentBlock::tool_result("call_2", "contents"),
                ],
            ),
        ];
        let messages = encode_turns(&turns);
        assert_eq!(messages.len(), 4);

        let json = serde_json::to_value(&messages).unwrap();
        assert!(json[1].get("content").is_none());
        assert_eq!(json[1]["tool_calls"][0]["type"], "function");
        assert_eq!(
            json[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"command":"ls"}"#
        );
        assert_eq!(json[2]["role"], "tool");
        assert_eq!(json[2]["tool_call_id"], "call_1");
        assert_eq!(json[3]["tool_call_id"], "call_2");

        // Results fold back into one tool turn
        assert_eq!(decode_messages(messages), turns);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "Bash", "arguments": "{\"command\":\"pwd\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 50, "completion_tokens": 12, "total_tokens": 62}
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        let response = parse_response(parsed).unwrap();

        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].arguments, r#"{"command":"pwd"}"#);
        assert_eq!(response.usage, Some(TokenUsage::new(50, 12)));
        assert_eq!(response.model, "gpt-4o-2024-08-06");
    }

    #[test]
    fn test_no_choices_is_malformed() {
        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices": [], "model": "gpt-4o"}"#).unwrap();
        let err = parse_response(parsed).unwrap_err();
        assert!(matches!(err, TandemError::MalformedResponse(_)));
    }

    #[test]
    fn test_classify_errors() {
        let err = classify_error(
            429,
            r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#,
        );
        assert!(err.is_rate_limited());
        assert!(matches!(err, TandemError::RateLimited(_)));

        let err = classify_error(
            401,
            r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error","code":"invalid_api_key"}}"#,
        );
        assert!(matches!(err, TandemError::Api { status: 401, ref message } if message == "Incorrect API key"));
    }

    #[test]
    fn test_reasoning_model_detection() {
        assert!(is_reasoning_model("o3"));
        assert!(is_reasoning_model("o4-mini"));
        assert!(!is_reasoning_model("gpt-4o"));
        assert!(!is_reasoning_model("ollama-proxy"));
    }
}
