//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::cli::repl::CancelOnCtrlC;
use crate::core::{Result, TandemError};

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, agent: &mut Agent) -> Result<CommandResult> {
    let input = input.trim();
    // Commands match the whole line; anything else goes to the model
    let cmd = input.trim_start_matches('/').to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            agent.clear_history();
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "status" => Ok(CommandResult::Handled(status_text(agent))),

        "cost" => Ok(CommandResult::Handled(
            agent.adapter().session().usage_summary(),
        )),

        "compact" => {
            let guard = CancelOnCtrlC::new();
            let output = compact(agent, guard.token()).await?;
            Ok(CommandResult::Handled(output))
        }

        "tools" => {
            let defs = agent.adapter().tool_definitions();
            if defs.is_empty() {
                return Ok(CommandResult::Handled("No tools enabled.".to_string()));
            }
            let output = defs
                .iter()
                .map(|d| format!("  {:<10} {}", d.name, d.description))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(CommandResult::Handled(format!("Tools:\n{}", output)))
        }

        _ => {
            // Not a command, treat as normal input
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Summarize older turns now; Ctrl+C through `cancel` abandons the pass
pub async fn compact(agent: &mut Agent, cancel: &CancellationToken) -> Result<String> {
    let before = agent.adapter().conversation().len();
    match agent.compact(cancel).await {
        Ok(true) => Ok(format!(
            "Conversation compacted: {} → {} turns",
            before,
            agent.adapter().conversation().len()
        )),
        Ok(false) => Ok("Nothing to compact yet.".to_string()),
        Err(TandemError::Canceled) => Ok("Compaction canceled.".to_string()),
        Err(e) => Err(e),
    }
}

fn status_text(agent: &Agent) -> String {
    let config = agent.config();
    let session = agent.adapter().session();
    format!(
        "Tandem Status:\n\
         ─────────────────────────────\n\
         Provider:       {}\n\
         Model:          {}\n\
         History:        {} turns\n\
         Context:        {}/{} tokens\n\
         Auto-summarize: {}",
        config.provider,
        session.model,
        agent.adapter().conversation().len(),
        session.input_tokens,
        session.context_window,
        if config.agent.auto_summarize {
            "on"
        } else {
            "off"
        }
    )
}

/// Generate help text
fn help_text() -> String {
    r#"Tandem Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Tandem
  clear, reset     Clear conversation history
  status           Show provider, model and context usage
  cost             Show token usage and cost so far
  compact          Summarize older turns now
  tools            List enabled tools

Keyboard Shortcuts:
  Ctrl+C           Cancel the running request
  Ctrl+D           Exit Tandem
─────────────────────────────────────────────"#
        .to_string()
}
