//! Tandem - command-line AI assistant
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use clap::Parser;
use tandem::agent::LoopOutcome;
use tandem::cli::repl::spawn_event_printer;
use tandem::core::logging::init_logging;
use tandem::{Agent, CancelOnCtrlC, Config, ProviderKind, Repl};

/// Exit status used when the user cancels a one-shot run
const EXIT_CANCELED: i32 = 130;

/// Tandem - command-line AI assistant for Anthropic and OpenAI models
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Provider to use (anthropic or openai)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Model of the selected provider
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Path to a config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Print token usage and cost after a one-shot answer
    #[arg(long)]
    cost: bool,

    /// Do not offer any tools to the model
    #[arg(long)]
    no_tools: bool,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = match &args.config {
        Some(path) => {
            let _ = dotenvy::dotenv();
            Config::load_from_path(path)?
        }
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.provider = provider;
    }

    if let Some(ref model) = args.model {
        config.set_model(model.clone());
    }

    if args.cost {
        config.agent.show_cost = true;
    }

    if args.no_tools {
        config.tools.enabled.clear();
    }

    init_logging(&config.logging, args.debug);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let show_cost = config.agent.show_cost;
        let mut agent = Agent::with_config(config)?;
        spawn_event_printer(agent.subscribe());

        let guard = CancelOnCtrlC::new();
        match agent.process(&prompt, guard.token()).await? {
            LoopOutcome::Completed(response) => {
                println!("{}", response);
                if show_cost {
                    eprintln!("{}", agent.adapter().session().usage_summary());
                }
            }
            LoopOutcome::Canceled => {
                eprintln!("Canceled.");
                std::process::exit(EXIT_CANCELED);
            }
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
