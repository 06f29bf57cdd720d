//! Model definitions and presets
//!
//! Context windows and list prices used for budget and cost accounting.

use crate::core::ProviderKind;

/// Model preset with budget and pricing data
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPreset {
    /// Model identifier prefix
    pub name: &'static str,
    /// Wire protocol that serves this model
    pub provider: ProviderKind,
    /// Maximum tokens visible to the model per call
    pub context_window: u64,
    /// USD per million input tokens
    pub price_per_million_in: f64,
    /// USD per million output tokens
    pub price_per_million_out: f64,
}

const fn preset(
    name: &'static str,
    provider: ProviderKind,
    context_window: u64,
    price_per_million_in: f64,
    price_per_million_out: f64,
) -> ModelPreset {
    ModelPreset {
        name,
        provider,
        context_window,
        price_per_million_in,
        price_per_million_out,
    }
}

static PRESETS: &[ModelPreset] = &[
    preset("claude-opus-4", ProviderKind::Anthropic, 200_000, 15.0, 75.0),
    preset("claude-sonnet-4", ProviderKind::Anthropic, 200_000, 3.0, 15.0),
    preset("claude-haiku-4", ProviderKind::Anthropic, 200_000, 1.0, 5.0),
    preset("claude-3-7-sonnet", ProviderKind::Anthropic, 200_000, 3.0, 15.0),
    preset("claude-3-5-haiku", ProviderKind::Anthropic, 200_000, 0.8, 4.0),
    preset("gpt-4o", ProviderKind::OpenAI, 128_000, 2.5, 10.0),
    preset("gpt-4o-mini", ProviderKind::OpenAI, 128_000, 0.15, 0.6),
    preset("gpt-4.1", ProviderKind::OpenAI, 1_047_576, 2.0, 8.0),
    preset("gpt-4.1-mini", ProviderKind::OpenAI, 1_047_576, 0.4, 1.6),
    preset("o3", ProviderKind::OpenAI, 200_000, 2.0, 8.0),
    preset("o4-mini", ProviderKind::OpenAI, 200_000, 1.1, 4.4),
];

/// Get predefined model presets
pub fn get_model_presets() -> &'static [ModelPreset] {
    PRESETS
}

/// Find the preset whose name is the longest prefix of `model`
pub fn find_preset(model: &str) -> Option<&'static ModelPreset> {
    PRESETS
        .iter()
        .filter(|p| model.starts_with(p.name))
        .max_by_key(|p| p.name.len())
}

/// Fallback used for models without a preset
pub fn default_preset(provider: ProviderKind) -> &'static ModelPreset {
    match provider {
        ProviderKind::Anthropic => &PRESETS[1],
        ProviderKind::OpenAI => &PRESETS[5],
    }
}
