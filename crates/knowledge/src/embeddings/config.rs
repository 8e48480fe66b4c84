//! Embedding configuration types.

use corpsearch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding provider configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to normalize embeddings to unit length
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// Maximum number of texts per provider call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound for a single provider call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Provider-specific configuration (JSON object)
    #[serde(default)]
    pub provider_config: serde_json::Value,
}

fn default_normalize() -> bool {
    true
}

fn default_batch_size() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider("trigram")
    }
}

impl EmbeddingConfig {
    /// Default settings for a named provider.
    ///
    /// Unknown names keep the trigram model settings; `create_provider`
    /// rejects them later.
    pub fn for_provider(provider: &str) -> Self {
        let (model, dimensions) = match provider {
            "ollama" => ("paraphrase-multilingual", 768),
            "mock" => ("mock-v1", 64),
            _ => ("trigram-v1", 384),
        };

        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            normalize: default_normalize(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            provider_config: serde_json::json!({}),
        }
    }

    /// Apply provider/model overrides from the application config.
    ///
    /// Switching provider resets model and dimensions to that provider's
    /// defaults before the model override is applied.
    pub fn with_overrides(mut self, provider: Option<&str>, model: Option<&str>) -> Self {
        if let Some(provider) = provider {
            if provider != self.provider {
                let defaults = Self::for_provider(provider);
                self.provider = defaults.provider;
                self.model = defaults.model;
                self.dimensions = defaults.dimensions;
            }
        }

        if let Some(model) = model {
            self.model = model.to_string();
        }

        self
    }

    /// Version string recorded on every embedding this config produces.
    pub fn model_version(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }

    /// Provider call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Check the settings before a provider is built from them.
    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Embedding model must be set".to_string()));
        }

        Ok(())
    }
}
