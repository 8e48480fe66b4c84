//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{mock::MockProvider, ollama::OllamaProvider, trigram::TrigramProvider};
use corpsearch_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// `embed_batch` must preserve order and return exactly one vector per
/// input text. Identical text under the same model version must always
/// produce the same vector.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Version tag stored with every embedding this provider produces.
    fn model_version(&self) -> String {
        format!("{}:{}", self.provider_name(), self.model_name())
    }

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::ProviderEncode("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Loading can be expensive (the Ollama provider performs a round trip to
/// verify the model), so callers go through `EmbeddingEngine`, which runs
/// this once per process.
pub async fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config
        .validate()
        .map_err(|e| AppError::ProviderInit(e.to_string()))?;

    match config.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(
            &config.model,
            config.dimensions,
            config.normalize,
        ))),

        "mock" => Ok(Arc::new(MockProvider::from_config(config)?)),

        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone()).await?)),

        _ => Err(AppError::ProviderInit(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, mock",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let config = EmbeddingConfig::default();

        let provider = create_provider(&config).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.model_version(), config.model_version());
    }

    #[tokio::test]
    async fn test_create_mock_provider() {
        let config = EmbeddingConfig::for_provider("mock");

        let provider = create_provider(&config).await.unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 64);
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            ..EmbeddingConfig::default()
        };

        let result = create_provider(&config).await;
        match result {
            Err(AppError::ProviderInit(msg)) => {
                assert!(msg.contains("Unknown embedding provider"))
            }
            other => panic!("expected ProviderInit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_config_is_init_error() {
        let config = EmbeddingConfig {
            batch_size: 0,
            ..EmbeddingConfig::default()
        };

        let result = create_provider(&config).await;
        assert!(matches!(result, Err(AppError::ProviderInit(_))));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let config = EmbeddingConfig::default();
        let provider = create_provider(&config).await.unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
