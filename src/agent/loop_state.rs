//! Agent loop state management
//!
//! Tracks the phase of the tool-calling loop and rejects illegal transitions.

use std::fmt;

use tracing::debug;

use crate::core::{Result, TandemError};

/// Phase of the agent loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Waiting for a prompt
    AwaitingInput,
    /// A provider call is in flight
    Inferring,
    /// Inspecting the response for tool requests
    CheckToolCalls,
    /// Dispatching requested tools
    ExecutingTools,
    /// Final answer produced or loop canceled
    Done,
}

impl LoopPhase {
    /// Whether moving from `self` to `next` is legal
    pub fn can_transition_to(self, next: LoopPhase) -> bool {
        use LoopPhase::*;
        matches!(
            (self, next),
            (AwaitingInput, Inferring)
                | (Inferring, CheckToolCalls)
                | (CheckToolCalls, ExecutingTools)
                | (CheckToolCalls, Done)
                | (ExecutingTools, Inferring)
                | (_, Done)
        )
    }
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopPhase::AwaitingInput => "awaiting_input",
            LoopPhase::Inferring => "inferring",
            LoopPhase::CheckToolCalls => "check_tool_calls",
            LoopPhase::ExecutingTools => "executing_tools",
            LoopPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// State of one agent loop invocation
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    /// Current phase
    pub phase: LoopPhase,
    /// Number of inference calls issued
    pub iterations: usize,
    /// Number of tool calls dispatched
    pub tool_calls: usize,
}

impl AgentLoopState {
    /// Create a loop state waiting for input
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::AwaitingInput,
            iterations: 0,
            tool_calls: 0,
        }
    }

    /// Move to `next`, failing on an illegal transition
    pub fn transition(&mut self, next: LoopPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(TandemError::Other(format!(
                "illegal loop transition {} -> {}",
                self.phase, next
            )));
        }
        debug!(from = %self.phase, to = %next, iteration = self.iterations, "loop transition");
        if next == LoopPhase::Inferring {
            self.iterations += 1;
        }
        self.phase = next;
        Ok(())
    }

    /// Count a dispatched tool call
    pub fn record_tool_call(&mut self) {
        self.tool_calls += 1;
    }

    /// Check if the loop has finished
    pub fn is_done(&self) -> bool {
        self.phase == LoopPhase::Done
    }
}

impl Default for AgentLoopState {
    fn default() -> Self {
        Self::new()
    }
}
