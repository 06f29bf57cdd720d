//! Per-provider token accounting
//!
//! Tracks context usage for the summarization budget and lifetime usage for
//! cost reporting.

use crate::core::config::{ProviderConfig, ProviderKind};
use crate::llm::models::{default_preset, find_preset};
use crate::llm::traits::TokenUsage;

/// Token counters, prices and limits of the active provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSession {
    /// Input tokens since the last summarization
    pub input_tokens: u64,
    /// Output tokens since the last summarization
    pub output_tokens: u64,
    /// Input tokens over the whole session (never reset)
    pub billed_input_tokens: u64,
    /// Output tokens over the whole session (never reset)
    pub billed_output_tokens: u64,
    pub price_per_million_in: f64,
    pub price_per_million_out: f64,
    pub context_window: u64,
    pub model: String,
}

impl ProviderSession {
    /// Create an empty session
    pub fn new(
        model: impl Into<String>,
        context_window: u64,
        price_per_million_in: f64,
        price_per_million_out: f64,
    ) -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            billed_input_tokens: 0,
            billed_output_tokens: 0,
            price_per_million_in,
            price_per_million_out,
            context_window,
            model: model.into(),
        }
    }

    /// Build from provider config; preset data fills unset limits and prices
    pub fn from_config(kind: ProviderKind, config: &ProviderConfig) -> Self {
        let preset = find_preset(&config.model).unwrap_or_else(|| default_preset(kind));
        Self::new(
            config.model.clone(),
            config.context_window.unwrap_or(preset.context_window),
            config
                .price_per_million_in
                .unwrap_or(preset.price_per_million_in),
            config
                .price_per_million_out
                .unwrap_or(preset.price_per_million_out),
        )
    }

    /// Accumulate usage reported by a successful call
    pub fn record(&mut self, usage: TokenUsage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.billed_input_tokens += usage.input_tokens;
        self.billed_output_tokens += usage.output_tokens;
    }

    /// Zero both context counters; lifetime totals are kept
    pub fn reset_context_counters(&mut self) {
        self.input_tokens = 0;
        self.output_tokens = 0;
    }

    /// Total spend in USD over the whole session
    pub fn calculate_price(&self) -> f64 {
        (self.billed_input_tokens as f64 * self.price_per_million_in
            + self.billed_output_tokens as f64 * self.price_per_million_out)
            / 1_000_000.0
    }

    /// One-line usage summary for the CLI
    pub fn usage_summary(&self) -> String {
        format!(
            "{} | tokens in: {} out: {} | context: {}/{} | cost: ${:.4}",
            self.model,
            self.billed_input_tokens,
            self.billed_output_tokens,
            self.input_tokens,
            self.context_window,
            self.calculate_price()
        )
    }
}
