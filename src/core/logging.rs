//! Logging initialization for Tandem
//!
//! Installs a global `tracing` subscriber that writes to stderr, so stdout
//! stays reserved for answers.

use tracing_subscriber::EnvFilter;

use crate::core::config::LoggingConfig;

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// `RUST_LOG` wins over the configured level; `debug` forces `debug`.
pub fn init_logging(cfg: &LoggingConfig, debug: bool) {
    let filter = if debug {
        EnvFilter::new("tandem=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level))
    };

    let result = if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .try_init()
    };

    // A subscriber may already be installed when embedded; keep it.
    let _ = result;
}
