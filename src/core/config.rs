//! Configuration management for Tandem
//!
//! Supports environment variables, config files, and runtime overrides.
//! The provider is selected once at startup from configuration.
//!
//! Config file location: ~/.config/tandem/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TandemError};

/// Default instructions sent as the leading system turn
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Tandem, a command-line assistant working in the user's current directory. \
Use the available tools to inspect and change files or run commands when that helps. \
Call tools as needed, observe their output, and continue until the task is done. \
When you are finished, reply with a concise final answer and no tool calls.";

/// Main configuration for Tandem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which remote API to talk to
    #[serde(default)]
    pub provider: ProviderKind,
    /// Leading system turn
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Files seeded as leading user turns; missing files are skipped
    #[serde(default = "default_rule_files")]
    pub rule_files: Vec<PathBuf>,
    /// Anthropic Messages API settings
    #[serde(default = "ProviderConfig::anthropic")]
    pub anthropic: ProviderConfig,
    /// OpenAI Chat Completions API settings
    #[serde(default = "ProviderConfig::openai")]
    pub openai: ProviderConfig,
    /// Agent behavior
    #[serde(default)]
    pub agent: AgentConfig,
    /// Tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Supported provider wire protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
}

impl Default for ProviderKind {
    fn default() -> Self {
        env::var("TANDEM_PROVIDER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(ProviderKind::Anthropic)
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = TandemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "gpt" => Ok(ProviderKind::OpenAI),
            other => Err(TandemError::config(format!(
                "Unknown provider '{}'. Expected 'anthropic' or 'openai'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// Settings for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; falls back to the provider's environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (overridable for proxies and compatible servers)
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate per call
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Context window override; defaults to the model preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
    /// USD per million input tokens override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_million_in: Option<f64>,
    /// USD per million output tokens override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_million_out: Option<f64>,
}

impl ProviderConfig {
    /// Defaults for the Anthropic Messages API
    pub fn anthropic() -> Self {
        Self {
            api_key: None,
            base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            model: env::var("TANDEM_ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5-20250929".to_string()),
            max_tokens: 8192,
            timeout_secs: 300,
            context_window: None,
            price_per_million_in: None,
            price_per_million_out: None,
        }
    }

    /// Defaults for the OpenAI Chat Completions API
    pub fn openai() -> Self {
        Self {
            api_key: None,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("TANDEM_OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            max_tokens: 8192,
            timeout_secs: 300,
            context_window: None,
            price_per_million_in: None,
            price_per_million_out: None,
        }
    }
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Summarize automatically when input tokens near the context window
    pub auto_summarize: bool,
    /// Print a token/cost summary after one-shot answers
    pub show_cost: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            auto_summarize: true,
            show_cost: env::var("TANDEM_SHOW_COST")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Names of the tools offered to the model
    pub enabled: Vec<String>,
    /// Default timeout for Bash commands
    pub bash_timeout_secs: u64,
    /// Tool output is truncated past this many bytes
    pub max_output_bytes: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                "Bash".to_string(),
                "ReadFile".to_string(),
                "WriteFile".to_string(),
            ],
            bash_timeout_secs: 120,
            max_output_bytes: 30_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

fn default_system_prompt() -> String {
    env::var("TANDEM_SYSTEM_PROMPT").unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string())
}

fn default_rule_files() -> Vec<PathBuf> {
    vec![PathBuf::from("AGENTS.md"), PathBuf::from(".tandem/rules.md")]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            system_prompt: default_system_prompt(),
            rule_files: default_rule_files(),
            anthropic: ProviderConfig::anthropic(),
            openai: ProviderConfig::openai(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tandem")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env-aware defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_path(&Self::config_file()) {
            return config;
        }

        Self::default()
    }

    /// Load configuration from an explicit file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TandemError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| TandemError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; omitted fields take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TandemError::config(format!("Failed to parse config: {}", e)))
    }

    /// Settings of the selected provider
    pub fn active_provider(&self) -> &ProviderConfig {
        match self.provider {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAI => &self.openai,
        }
    }

    /// Mutable settings of the selected provider
    pub fn active_provider_mut(&mut self) -> &mut ProviderConfig {
        match self.provider {
            ProviderKind::Anthropic => &mut self.anthropic,
            ProviderKind::OpenAI => &mut self.openai,
        }
    }

    /// API key of the selected provider, from config or environment
    pub fn api_key(&self) -> Result<String> {
        let var = match self.provider {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
        };

        self.active_provider()
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env::var(var).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                TandemError::config(format!(
                    "No API key for {}. Set {} or add api_key to {}",
                    self.provider,
                    var,
                    Self::config_file().display()
                ))
            })
    }

    /// Update the model of the selected provider
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.active_provider_mut().model = model.into();
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.agent.auto_summarize);
        assert_eq!(config.tools.enabled, vec!["Bash", "ReadFile", "WriteFile"]);
        assert_eq!(config.tools.bash_timeout_secs, 120);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert!("ollama".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
provider = "openai"
rule_files = []

[openai]
base_url = "http://localhost:8080/v1"
model = "gpt-4o-mini"
max_tokens = 1024
timeout_secs = 30
context_window = 64000
"#,
        )
        .unwrap();

        assert_eq!(config.provider, ProviderKind::OpenAI);
        assert!(config.rule_files.is_empty());
        assert_eq!(config.active_provider().model, "gpt-4o-mini");
        assert_eq!(config.active_provider().context_window, Some(64000));
        assert!(config.anthropic.base_url.starts_with("http"));
        assert!(config.agent.auto_summarize);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("provider = 3").unwrap_err();
        assert!(matches!(err, TandemError::Config(_)));
    }

    #[test]
    fn test_api_key_from_config() {
        let mut config = Config::default();
        config.provider = ProviderKind::Anthropic;
        config.anthropic.api_key = Some("sk-test".to_string());
        assert_eq!(config.api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_set_model_targets_active_provider() {
        let mut config = Config::default();
        config.provider = ProviderKind::OpenAI;
        config.set_model("gpt-4.1");
        assert_eq!(config.openai.model, "gpt-4.1");
        assert_ne!(config.anthropic.model, "gpt-4.1");
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("[anthropic]"));
        assert!(toml_str.contains("[openai]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("tandem"));
    }
}
