//! Mock embedding provider for tests and dry runs.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::provider::EmbeddingProvider;
use corpsearch_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock provider that records how it is called.
///
/// Vectors are a hashed bag of lowercase words, so texts sharing words
/// score above zero and identical texts score 1.0. Failures and latency can
/// be injected to exercise timeout and atomic-commit paths.
///
/// Recognised `provider_config` keys: `fail_on` (string), `delay_ms` (integer).
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    dimensions: usize,
    fail_on: Option<String>,
    delay: Option<Duration>,
    batch_calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(model: &str, dimensions: usize) -> Self {
        Self {
            model: model.to_string(),
            dimensions,
            fail_on: None,
            delay: None,
            batch_calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        }
    }

    /// Build from an embedding config, reading injection settings from
    /// `provider_config`.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let mut provider = Self::new(&config.model, config.dimensions);

        if let Some(value) = config.provider_config.get("fail_on") {
            let needle = value.as_str().ok_or_else(|| {
                AppError::ProviderInit("mock provider: 'fail_on' must be a string".to_string())
            })?;
            provider = provider.failing_on(needle);
        }

        if let Some(value) = config.provider_config.get("delay_ms") {
            let millis = value.as_u64().ok_or_else(|| {
                AppError::ProviderInit("mock provider: 'delay_ms' must be an integer".to_string())
            })?;
            provider = provider.with_delay(Duration::from_millis(millis));
        }

        Ok(provider)
    }

    /// Fail any batch containing a text with this substring.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Sleep before answering each batch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `embed_batch` calls received.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Total number of texts received across all calls.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    fn generate_mock_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        for word in text.to_lowercase().split_whitespace() {
            let hash = word
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
                    (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
                });
            embedding[(hash % self.dimensions as u64) as usize] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref needle) = self.fail_on {
            if let Some(text) = texts.iter().find(|t| t.contains(needle.as_str())) {
                return Err(AppError::ProviderEncode(format!(
                    "mock provider refused text: {}",
                    text
                )));
            }
        }

        Ok(texts
            .iter()
            .map(|text| self.generate_mock_embedding(text))
            .collect())
    }
}
