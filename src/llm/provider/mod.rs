//! LLM Provider implementations and factory
//!
//! Submodules implement the two supported wire protocols.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use tracing::info;

use crate::core::config::{Config, ProviderKind};
use crate::core::Result;
use crate::llm::traits::LLMProvider;

pub use self::anthropic::AnthropicProvider;
pub use self::openai::OpenAIProvider;

/// Create the LLM provider selected by configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let api_key = config.api_key()?;
    let settings = config.active_provider();

    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::from_config(settings, api_key)?),
        ProviderKind::OpenAI => Arc::new(OpenAIProvider::from_config(settings, api_key)?),
    };

    info!(
        provider = provider.name(),
        model = provider.model(),
        base_url = %settings.base_url,
        "provider ready"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_selected_provider() {
        let mut config = Config::default();
        config.provider = ProviderKind::OpenAI;
        config.openai.api_key = Some("sk-test".to_string());
        config.openai.model = "gpt-4o-mini".to_string();

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");

        config.provider = ProviderKind::Anthropic;
        config.anthropic.api_key = Some("sk-ant-test".to_string());
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
