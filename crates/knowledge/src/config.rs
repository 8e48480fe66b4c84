//! Knowledge base configuration management.

use crate::embeddings::EmbeddingConfig;
use corpsearch_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for the search service, stored in `.corpsearch/knowledge.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBaseConfig {
    /// Number of results returned when the caller does not pass `k`
    #[serde(default = "default_top_k")]
    pub default_top_k: i64,

    /// Document file loaded at start-up
    #[serde(default)]
    pub documents: Option<PathBuf>,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_top_k() -> i64 {
    3
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            documents: None,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl KnowledgeBaseConfig {
    /// Apply the application-level provider, model and document overrides.
    pub fn with_app_overrides(mut self, app: &AppConfig) -> Self {
        self.embedding = self
            .embedding
            .with_overrides(app.provider.as_deref(), app.model.as_deref());

        if app.documents.is_some() {
            self.documents = app.documents.clone();
        }

        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.default_top_k < 0 {
            return Err(AppError::Config(format!(
                "default_top_k must be non-negative, got {}",
                self.default_top_k
            )));
        }

        self.embedding.validate()
    }
}

/// Load knowledge base configuration.
///
/// Loads from `.corpsearch/knowledge.yaml` if it exists, otherwise returns
/// the defaults. Relative document paths resolve against the workspace.
pub fn load_config(workspace: &Path) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("Using default knowledge base config (no config file found)");
        return Ok(KnowledgeBaseConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    if let Some(documents) = config.documents.as_mut() {
        if documents.is_relative() {
            *documents = workspace.join(&*documents);
        }
    }

    tracing::debug!("Loaded knowledge base config from {:?}", config_path);
    Ok(config)
}

/// Get the path to the knowledge config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".corpsearch").join("knowledge.yaml")
}
