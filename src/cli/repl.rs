//! Interactive REPL for Tandem
//!
//! Provides the main user interaction loop. Ctrl+C cancels the running
//! agent loop; Ctrl+D or `exit` leaves the REPL.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, AgentEvent, LoopOutcome};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};

/// Cancellation token fired by Ctrl+C while this guard is alive
pub struct CancelOnCtrlC {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl CancelOnCtrlC {
    /// Start watching for Ctrl+C
    pub fn new() -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        Self { token, watcher }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for CancelOnCtrlC {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelOnCtrlC {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Print agent progress to stderr until the agent goes away
pub fn spawn_event_printer(mut events: mpsc::UnboundedReceiver<AgentEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                AgentEvent::Inferring { iteration } if iteration > 1 => {
                    eprintln!("  … thinking (step {})", iteration);
                }
                AgentEvent::ToolStarted { name, .. } => eprintln!("  → {}", name),
                AgentEvent::ToolFinished {
                    name,
                    is_error: true,
                    ..
                } => eprintln!("  ✗ {} failed", name),
                AgentEvent::Canceled => eprintln!("  ⏹ canceled"),
                _ => {}
            }
        }
    })
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let mut agent = Agent::with_config(config)?;
        spawn_event_printer(agent.subscribe());
        Ok(Self { agent })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = io::stdout();

        loop {
            // Print prompt
            print!("You: ");
            stdout.flush()?;

            // Read input
            let input = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            };

            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            // Handle commands
            match handle_command(input, &mut self.agent).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Conversation cleared.\n");
                    continue;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                    continue;
                }
                Ok(CommandResult::None) => continue,
                Ok(CommandResult::Continue(input)) => {
                    let guard = CancelOnCtrlC::new();
                    match self.agent.process(&input, guard.token()).await {
                        Ok(LoopOutcome::Completed(response)) => {
                            println!("\nAssistant:\n{}\n", response);
                        }
                        Ok(LoopOutcome::Canceled) => {
                            println!("\nCanceled.\n");
                        }
                        Err(e) => {
                            eprintln!("\nError: {}\n", e);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.agent.config();
        let session = self.agent.adapter().session();

        println!();
        println!("Tandem - command-line assistant");
        println!("────────────────────────────────────────");
        println!("Provider:   {}", config.provider);
        println!("Model:      {}", session.model);
        println!("Context:    {} tokens", session.context_window);
        println!(
            "Tools:      {}",
            self.agent
                .adapter()
                .tool_definitions()
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
        println!("Commands: help, status, cost, compact, tools, clear, exit");
        println!("Ctrl+C cancels a running request, Ctrl+D exits.");
        println!("────────────────────────────────────────");
    }
}
