//! Conversation history management
//!
//! Holds the ordered turns sent to the provider and enforces tool pairing:
//! a tool result is only accepted for a tool use that is still pending.

use std::path::Path;

use tracing::debug;

use crate::core::{Content, ContentBlock, Result, Role, TandemError, ToolCallRequest, Turn};

/// Text recorded for tool uses that never received a result
pub const CANCELED_TOOL_RESULT: &str = "Tool call was canceled by the user before it completed.";

/// Manages conversation history
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Turn history, system prompt first when present
    turns: Vec<Turn>,
    /// Seeded state restored by `clear`
    initial: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation whose first turn is the system prompt
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let turns = vec![Turn::system(prompt)];
        Self {
            initial: turns.clone(),
            turns,
        }
    }

    /// Seed rule files as leading user turns; missing files are skipped.
    ///
    /// Returns how many files were loaded.
    pub fn seed_rule_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        let mut loaded = 0;
        for path in paths {
            let path = path.as_ref();
            match std::fs::read_to_string(path) {
                Ok(content) if !content.trim().is_empty() => {
                    debug!(path = %path.display(), "seeded rule file");
                    self.turns.push(Turn::user(content));
                    loaded += 1;
                }
                Ok(_) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "rule file skipped"),
            }
        }
        self.initial = self.turns.clone();
        loaded
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Add an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// Add an arbitrary turn; a system turn is only valid first
    pub fn add_turn(&mut self, turn: Turn) -> Result<()> {
        if turn.role == Role::System && !self.turns.is_empty() {
            return Err(TandemError::conversation(
                "system turn may only be the first turn",
            ));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Add an assistant turn carrying tool uses, with leading text if any
    pub fn add_assistant_tool_uses(&mut self, text: &str, calls: &[ToolCallRequest]) {
        let mut blocks = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            blocks.push(ContentBlock::text(text));
        }
        blocks.extend(calls.iter().map(ContentBlock::from));
        self.turns.push(Turn::blocks(Role::Assistant, blocks));
    }

    /// Append a tool result for a pending tool use.
    ///
    /// Results accumulate in a single tool turn following the assistant turn
    /// that issued the calls.
    pub fn add_tool_result(&mut self, tool_use_id: &str, output: impl Into<String>) -> Result<()> {
        if !self.pending_tool_uses().iter().any(|id| id == tool_use_id) {
            return Err(TandemError::conversation(format!(
                "no pending tool use with id '{}'",
                tool_use_id
            )));
        }

        let block = ContentBlock::tool_result(tool_use_id, output);
        match self.turns.last_mut() {
            Some(Turn {
                role: Role::Tool,
                content: Content::Blocks(blocks),
            }) => blocks.push(block),
            _ => self.turns.push(Turn::blocks(Role::Tool, vec![block])),
        }
        Ok(())
    }

    /// Ids of tool uses in the latest assistant turn still lacking a result
    pub fn pending_tool_uses(&self) -> Vec<String> {
        let (assistant, answered) = match self.turns.last() {
            Some(turn) if turn.role == Role::Assistant => (turn, Vec::new()),
            Some(turn) if turn.role == Role::Tool => {
                let prev = self.turns.len().checked_sub(2).map(|i| &self.turns[i]);
                match prev {
                    Some(prev) if prev.role == Role::Assistant => (prev, turn.tool_result_ids()),
                    _ => return Vec::new(),
                }
            }
            _ => return Vec::new(),
        };

        assistant
            .tool_use_ids()
            .into_iter()
            .filter(|id| !answered.contains(id))
            .map(str::to_string)
            .collect()
    }

    /// Answer every pending tool use with `message`; returns how many
    pub fn close_dangling_tool_uses(&mut self, message: &str) -> usize {
        let pending = self.pending_tool_uses();
        for id in &pending {
            // Ids come from pending_tool_uses, so this cannot fail
            let _ = self.add_tool_result(id, message);
        }
        pending.len()
    }

    /// Replace everything except the system turn and the last `keep` turns
    /// with a synthetic assistant summary
    pub fn replace_with_summary(&mut self, summary: impl Into<String>, keep: usize) {
        let system = self.system_turn().cloned();
        let tail_start = self.turns.len().saturating_sub(keep);
        let tail: Vec<Turn> = self.turns.drain(tail_start..).collect();

        let mut turns = Vec::with_capacity(tail.len() + 2);
        turns.extend(system);
        turns.push(Turn::assistant(summary));
        turns.extend(tail);
        self.turns = turns;
    }

    /// The leading system turn, if any
    pub fn system_turn(&self) -> Option<&Turn> {
        self.turns.first().filter(|t| t.role == Role::System)
    }

    /// All turns, system prompt first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Get the last N turns
    pub fn last_n(&self, n: usize) -> &[Turn] {
        &self.turns[self.turns.len().saturating_sub(n)..]
    }

    /// Get the last assistant turn
    pub fn last_assistant(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    /// Reset to the seeded state (system prompt and rule files)
    pub fn clear(&mut self) {
        self.turns = self.initial.clone();
    }

    /// Get turn count
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
