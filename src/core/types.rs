//! Shared types used across Tandem modules
//!
//! Contains the unified content model that both provider backends translate
//! to and from, plus tool call and tool definition structures.

use serde::{Deserialize, Serialize};

/// Role of a turn in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions; only valid as the first turn
    System,
    /// Human input, including seeded rule files
    User,
    /// Model output
    Assistant,
    /// Results of tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A typed fragment of a turn's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },
    /// A tool invocation requested by the model
    ToolUse {
        id: String,
        name: String,
        /// Raw JSON argument text as emitted by the provider
        arguments: String,
    },
    /// The output of a tool invocation
    ToolResult { tool_use_id: String, text: String },
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool result block
    pub fn tool_result(tool_use_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            text: text.into(),
        }
    }
}

impl From<&ToolCallRequest> for ContentBlock {
    fn from(call: &ToolCallRequest) -> Self {
        Self::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        }
    }
}

impl From<ToolCallResult> for ContentBlock {
    fn from(result: ToolCallResult) -> Self {
        Self::ToolResult {
            tool_use_id: result.call_id,
            text: result.output,
        }
    }
}

/// Content of a turn: either a plain string or an ordered list of blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Plain(String),
    Blocks(Vec<ContentBlock>),
}

impl Content {
    /// Concatenated text of all text fragments
    pub fn text(&self) -> String {
        match self {
            Content::Plain(text) => text.clone(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Blocks of this content; plain content yields no blocks
    pub fn blocks(&self) -> &[ContentBlock] {
        match self {
            Content::Plain(_) => &[],
            Content::Blocks(blocks) => blocks,
        }
    }
}

/// One role-tagged entry in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Content,
}

impl Turn {
    /// Create a turn with plain content
    pub fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Plain(text.into()),
        }
    }

    /// Create a turn with block content
    pub fn blocks(role: Role, blocks: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content: Content::Blocks(blocks),
        }
    }

    /// Create a system turn
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    /// Create an assistant text turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        self.content.text()
    }

    /// Ids of the tool uses carried by this turn, in order
    pub fn tool_use_ids(&self) -> Vec<&str> {
        self.content
            .blocks()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Ids answered by the tool results carried by this turn, in order
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.content
            .blocks()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Render the turn as transcript text for the summarizer.
    ///
    /// Tool arguments and outputs longer than `max_block_chars` are cut.
    pub fn render_transcript(&self, max_block_chars: usize) -> String {
        let mut out = format!("[{}]\n", self.role);
        match &self.content {
            Content::Plain(text) => out.push_str(text),
            Content::Blocks(blocks) => {
                let parts: Vec<String> = blocks
                    .iter()
                    .map(|b| match b {
                        ContentBlock::Text { text } => text.clone(),
                        ContentBlock::ToolUse {
                            name, arguments, ..
                        } => format!(
                            "(called tool {} with {})",
                            name,
                            clip(arguments, max_block_chars)
                        ),
                        ContentBlock::ToolResult { tool_use_id, text } => format!(
                            "(result of {}): {}",
                            tool_use_id,
                            clip(text, max_block_chars)
                        ),
                    })
                    .collect();
                out.push_str(&parts.join("\n"));
            }
        }
        out
    }
}

/// Truncate on a char boundary, marking the cut
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}... [truncated]", kept)
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned id, echoed back with the result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Raw JSON argument text
    pub arguments: String,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Result of executing a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    /// Id of the originating [`ToolCallRequest`]
    pub call_id: String,
    /// Output text, or the rendered error
    pub output: String,
}

impl ToolCallResult {
    pub fn new(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_text_joins_text_blocks() {
        let content = Content::Blocks(vec![
            ContentBlock::text("first"),
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "Bash".into(),
                arguments: "{}".into(),
            },
            ContentBlock::text("second"),
        ]);
        assert_eq!(content.text(), "first\nsecond");
    }

    #[test]
    fn test_tool_ids() {
        let turn = Turn::blocks(
            Role::Assistant,
            vec![
                ContentBlock::text("running"),
                ContentBlock::from(&ToolCallRequest::new("a", "Bash", "{}")),
                ContentBlock::from(&ToolCallRequest::new("b", "ReadFile", "{}")),
            ],
        );
        assert_eq!(turn.tool_use_ids(), vec!["a", "b"]);
        assert!(turn.tool_result_ids().is_empty());

        let results = Turn::blocks(
            Role::Tool,
            vec![ContentBlock::from(ToolCallResult::new("a", "ok"))],
        );
        assert_eq!(results.tool_result_ids(), vec!["a"]);
    }

    #[test]
    fn test_block_serialization_is_tagged() {
        let block = ContentBlock::tool_result("t1", "ok");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["tool_use_id"], "t1");
    }

    #[test]
    fn test_transcript_clips_long_output() {
        let turn = Turn::blocks(
            Role::Tool,
            vec![ContentBlock::tool_result("t1", "x".repeat(50))],
        );
        let rendered = turn.render_transcript(10);
        assert!(rendered.starts_with("[tool]"));
        assert!(rendered.contains("[truncated]"));
        assert!(!rendered.contains(&"x".repeat(11)));
    }
}
