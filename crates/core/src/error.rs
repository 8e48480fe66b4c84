//! Error types for corpsearch.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, the embedding provider, document
//! validation, and ingestion of external document sources.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for corpsearch.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Provider failures are reported to the immediate caller and never leave
/// the vector index partially updated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedding model could not be loaded. Fatal for the service.
    #[error("Embedding provider failed to initialize: {0}")]
    ProviderInit(String),

    /// An embedding call failed during sync or query encoding
    #[error("Embedding provider error: {0}")]
    ProviderEncode(String),

    /// An embedding call did not complete in time
    #[error("Embedding provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// A document was rejected by the store
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A caller-supplied argument was out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An external document source could not be parsed
    #[error("Failed to parse document source {source_name}: {message}")]
    IngestionParse {
        source_name: String,
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether the error came from the embedding provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            AppError::ProviderInit(_) | AppError::ProviderEncode(_) | AppError::ProviderTimeout(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
