//! Ollama Embedding Provider
//!
//! Provides neural embeddings via Ollama's local API. The default model is
//! `paraphrase-multilingual` (768 dimensions), which handles Russian and
//! English knowledge bases alike.
//!
//! # Features
//! - Batch embedding through `/api/embed`
//! - Local-first (no API costs, privacy-preserving)
//! - Automatic retry with exponential backoff
//! - Connection and dimension check at start-up
//!
//! # Example
//! ```no_run
//! use corpsearch_knowledge::embeddings::{EmbeddingConfig, EmbeddingProvider};
//! use corpsearch_knowledge::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn demo() -> corpsearch_core::AppResult<()> {
//! let config = EmbeddingConfig::for_provider("ollama");
//! let provider = OllamaProvider::new(config).await?;
//! let embedding = provider.embed("Как настроить VPN?").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use corpsearch_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Ollama API endpoint for embeddings
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Maximum attempts for a failed request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client for API requests
    client: Arc<Client>,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "paraphrase-multilingual")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for Ollama embed API
#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from Ollama embed API
#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create new Ollama provider with configuration.
    ///
    /// The base URL comes from `provider_config.url`, then `OLLAMA_URL`,
    /// then the local default.
    ///
    /// # Errors
    /// * `AppError::ProviderInit` - If Ollama is not reachable or the model is invalid
    pub async fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::ProviderInit(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = config
            .provider_config
            .get("url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let provider = Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        };

        provider.verify_connection().await?;

        Ok(provider)
    }

    /// Verify Ollama connection and model availability
    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        let sample = vec!["test connection".to_string()];
        match self.embed_with_retries(&sample, MAX_RETRIES).await {
            Ok(mut embeddings) => {
                let len = embeddings.pop().map(|e| e.len()).unwrap_or(0);
                if len != self.dimensions {
                    return Err(AppError::ProviderInit(format!(
                        "Ollama model '{}' returned {} dimensions, expected {}",
                        self.model, len, self.dimensions
                    )));
                }
                debug!("Ollama connection verified, model '{}' ready", self.model);
                Ok(())
            }
            Err(e) => {
                error!("Failed to connect to Ollama: {}", e);
                Err(AppError::ProviderInit(format!(
                    "Ollama not available at {}. Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                    self.base_url, self.model, self.model
                )))
            }
        }
    }

    /// Embed a batch with retry logic
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String], retries: u32) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < retries {
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < retries {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding failed (attempt {}/{}), retrying in {}ms",
                            attempt, retries, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::ProviderEncode("Unknown embedding error".to_string())))
    }

    /// Embed a batch (no retries)
    #[instrument(skip(self, texts), fields(batch_size = texts.len()))]
    async fn embed_once(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::ProviderEncode(format!("Failed to send request to Ollama: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error)
                .unwrap_or(error_text);

            return Err(AppError::ProviderEncode(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            AppError::ProviderEncode(format!("Failed to parse Ollama response: {}", e))
        })?;

        check_response(&body, texts.len(), self.dimensions)?;

        debug!("Generated {} embeddings", body.embeddings.len());
        Ok(body.embeddings)
    }
}

/// Validate the shape of an embed response.
fn check_response(body: &EmbedResponse, expected_len: usize, dimensions: usize) -> AppResult<()> {
    if body.embeddings.len() != expected_len {
        return Err(AppError::ProviderEncode(format!(
            "Ollama returned {} embeddings for {} inputs",
            body.embeddings.len(),
            expected_len
        )));
    }

    if let Some(bad) = body.embeddings.iter().find(|e| e.len() != dimensions) {
        return Err(AppError::ProviderEncode(format!(
            "Unexpected embedding dimensions: got {}, expected {}",
            bad.len(),
            dimensions
        )));
    }

    Ok(())
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.embed_with_retries(texts, MAX_RETRIES).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
