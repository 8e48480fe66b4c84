//! Embedding engine for the search service.
//!
//! Wraps a single embedding provider behind a lazy, once-only
//! initialisation and enforces batching, timeouts and output shape on every
//! call.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use corpsearch_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;

static GLOBAL_ENGINE: OnceLock<Arc<EmbeddingEngine>> = OnceLock::new();

/// Central embedding engine owning the process's provider.
///
/// The provider is created on first use. Concurrent first callers wait on
/// the same initialisation; a failed initialisation leaves the engine empty
/// so the next call retries.
#[derive(Debug)]
pub struct EmbeddingEngine {
    config: EmbeddingConfig,
    provider: OnceCell<Arc<dyn EmbeddingProvider>>,
    initializations: AtomicUsize,
}

impl EmbeddingEngine {
    /// Create an engine that builds its provider from `config` on first use.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            provider: OnceCell::new(),
            initializations: AtomicUsize::new(0),
        }
    }

    /// Create an engine around an already-built provider.
    ///
    /// Provider name, model and dimensions are taken from the provider;
    /// batching and timeout settings from `config`.
    ///
    /// # Errors
    /// * `AppError::ProviderInit` - The resulting configuration is invalid
    pub fn from_provider(
        provider: Arc<dyn EmbeddingProvider>,
        mut config: EmbeddingConfig,
    ) -> AppResult<Self> {
        config.provider = provider.provider_name().to_string();
        config.model = provider.model_name().to_string();
        config.dimensions = provider.dimensions();
        config
            .validate()
            .map_err(|e| AppError::ProviderInit(e.to_string()))?;

        Ok(Self {
            config,
            provider: OnceCell::new_with(Some(provider)),
            initializations: AtomicUsize::new(0),
        })
    }

    /// Process-wide engine. The first caller's config wins.
    pub fn global(config: EmbeddingConfig) -> Arc<EmbeddingEngine> {
        let requested = config.model_version();
        let engine = GLOBAL_ENGINE.get_or_init(|| Arc::new(Self::new(config)));

        if engine.model_version() != requested {
            tracing::warn!(
                "Embedding engine already running with '{}', ignoring request for '{}'",
                engine.model_version(),
                requested
            );
        }

        Arc::clone(engine)
    }

    /// Version string attached to every vector this engine produces.
    pub fn model_version(&self) -> String {
        self.config.model_version()
    }

    /// Vector length produced by this engine.
    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Configuration this engine runs with.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Number of provider initialisations attempted so far.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    /// Whether the provider has been loaded.
    pub fn is_ready(&self) -> bool {
        self.provider.initialized()
    }

    /// Get the provider, creating it on first call.
    pub async fn provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        let provider = self
            .provider
            .get_or_try_init(|| async {
                self.initializations.fetch_add(1, Ordering::SeqCst);

                tracing::info!(
                    "Loading embedding provider: provider={}, model={}, dimensions={}",
                    self.config.provider,
                    self.config.model,
                    self.config.dimensions
                );

                let provider = create_provider(&self.config).await?;

                if provider.dimensions() != self.config.dimensions {
                    return Err(AppError::ProviderInit(format!(
                        "Provider '{}' reports {} dimensions, expected {}",
                        provider.provider_name(),
                        provider.dimensions(),
                        self.config.dimensions
                    )));
                }

                Ok::<_, AppError>(provider)
            })
            .await?;

        Ok(Arc::clone(provider))
    }

    /// Encode a single text.
    pub async fn encode(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.encode_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::ProviderEncode("No embedding returned".to_string()))
    }

    /// Encode texts in order, splitting them into provider calls of at most
    /// `batch_size` texts.
    ///
    /// # Errors
    /// * `AppError::ProviderTimeout` - A provider call exceeded the configured timeout
    /// * `AppError::ProviderEncode` - The provider failed or returned malformed output
    pub async fn encode_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider().await?;
        let timeout = self.config.timeout();
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.batch_size.max(1)) {
            tracing::debug!(
                "Embedding batch of {} texts with {}",
                batch.len(),
                self.model_version()
            );

            let embedded = tokio::time::timeout(timeout, provider.embed_batch(batch))
                .await
                .map_err(|_| AppError::ProviderTimeout(timeout))??;

            self.check_batch(batch.len(), &embedded)?;
            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    fn check_batch(&self, expected: usize, vectors: &[Vec<f32>]) -> AppResult<()> {
        if vectors.len() != expected {
            return Err(AppError::ProviderEncode(format!(
                "Provider returned {} vectors for {} texts",
                vectors.len(),
                expected
            )));
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimensions) {
            return Err(AppError::ProviderEncode(format!(
                "Provider returned a vector of length {}, expected {}",
                bad.len(),
                self.config.dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockProvider;
    use std::time::Duration;

    fn mock_engine(mock: Arc<MockProvider>, batch_size: usize) -> EmbeddingEngine {
        let config = EmbeddingConfig {
            batch_size,
            ..EmbeddingConfig::for_provider("mock")
        };
        EmbeddingEngine::from_provider(mock, config).unwrap()
    }

    #[tokio::test]
    async fn test_engine_trigram_provider() {
        let engine = EmbeddingEngine::new(EmbeddingConfig::default());
        assert!(!engine.is_ready());

        let texts = vec!["hello world".to_string(), "test embedding".to_string()];
        let embeddings = engine.encode_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 384);
        assert!(engine.is_ready());
        assert_eq!(engine.model_version(), "trigram:trigram-v1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_initialises_once() {
        let engine = Arc::new(EmbeddingEngine::new(EmbeddingConfig::for_provider("mock")));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.encode(&format!("query {}", i)).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 64);
        }

        assert_eq!(engine.initializations(), 1);
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let config = EmbeddingConfig {
            provider: "nonexistent".to_string(),
            ..EmbeddingConfig::default()
        };
        let engine = EmbeddingEngine::new(config);

        assert!(matches!(
            engine.encode("x").await,
            Err(AppError::ProviderInit(_))
        ));
        assert!(engine.encode("x").await.is_err());
        assert_eq!(engine.initializations(), 2);
        assert!(!engine.is_ready());
    }

    #[tokio::test]
    async fn test_batches_split_by_batch_size() {
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = mock_engine(Arc::clone(&mock), 2);

        let texts: Vec<String> = (0..5).map(|i| format!("text {}", i)).collect();
        let embeddings = engine.encode_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 5);
        assert_eq!(mock.batch_calls(), 3);
        assert_eq!(mock.texts_embedded(), 5);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_provider() {
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = mock_engine(Arc::clone(&mock), 8);

        assert!(engine.encode_batch(&[]).await.unwrap().is_empty());
        assert_eq!(mock.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mock = Arc::new(MockProvider::new("mock-v1", 16).with_delay(Duration::from_millis(1500)));
        let config = EmbeddingConfig {
            timeout_secs: 1,
            ..EmbeddingConfig::for_provider("mock")
        };
        let engine = EmbeddingEngine::from_provider(mock, config).unwrap();

        let result = engine.encode("slow").await;
        assert!(matches!(result, Err(AppError::ProviderTimeout(_))));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mock = Arc::new(MockProvider::new("mock-v1", 16).failing_on("bad"));
        let engine = mock_engine(mock, 8);

        let result = engine.encode("bad input").await;
        assert!(matches!(result, Err(AppError::ProviderEncode(_))));
    }

    #[test]
    fn test_from_provider_takes_identity_from_provider() {
        let mock = Arc::new(MockProvider::new("mock-v9", 12));
        let engine = mock_engine(mock, 4);

        assert_eq!(engine.model_version(), "mock:mock-v9");
        assert_eq!(engine.dimensions(), 12);
        assert_eq!(engine.config().batch_size, 4);
        assert!(engine.is_ready());
    }

    #[test]
    fn test_from_provider_rejects_zero_batch_size() {
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let config = EmbeddingConfig {
            batch_size: 0,
            ..EmbeddingConfig::for_provider("mock")
        };

        let result = EmbeddingEngine::from_provider(mock, config);
        assert!(matches!(result, Err(AppError::ProviderInit(_))));
    }
}
