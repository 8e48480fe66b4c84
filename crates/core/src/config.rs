//! Configuration management for corpsearch.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.corpsearch/config.yaml)
//!
//! The configuration is workspace-centric, with local state stored in `.corpsearch/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["trigram", "ollama", "mock"];

/// Main application configuration.
///
/// Holds the global options that affect CLI behavior across commands.
/// Provider and model are optional overrides; when unset, the knowledge
/// base configuration decides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .corpsearch/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Embedding provider override (e.g., "trigram", "ollama")
    pub provider: Option<String>,

    /// Embedding model override
    pub model: Option<String>,

    /// Tabular document source to load at start-up
    pub documents: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    embedding: Option<EmbeddingOverride>,
    documents: Option<DocumentsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingOverride {
    provider: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentsConfig {
    path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: None,
            model: None,
            documents: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CORPSEARCH_WORKSPACE`: Override workspace path
    /// - `CORPSEARCH_CONFIG`: Path to config file
    /// - `CORPSEARCH_PROVIDER`: Embedding provider
    /// - `CORPSEARCH_MODEL`: Embedding model identifier
    /// - `CORPSEARCH_DOCUMENTS`: Tabular document source
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use corpsearch_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CORPSEARCH_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("CORPSEARCH_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.config_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CORPSEARCH_PROVIDER") {
            config.provider = Some(provider);
        }

        if let Ok(model) = std::env::var("CORPSEARCH_MODEL") {
            config.model = Some(model);
        }

        if let Ok(documents) = std::env::var("CORPSEARCH_DOCUMENTS") {
            config.documents = Some(PathBuf::from(documents));
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(embedding) = config_file.embedding {
            if embedding.provider.is_some() {
                result.provider = embedding.provider;
            }
            if embedding.model.is_some() {
                result.model = embedding.model;
            }
        }

        // Relative document paths are resolved against the workspace
        if let Some(path) = config_file.documents.and_then(|d| d.path) {
            let path = PathBuf::from(path);
            result.documents = Some(if path.is_relative() {
                result.workspace.join(path)
            } else {
                path
            });
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        documents: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = Some(provider);
        }

        if let Some(model) = model {
            self.model = Some(model);
        }

        if let Some(documents) = documents {
            self.documents = Some(documents);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .corpsearch directory.
    pub fn config_dir(&self) -> PathBuf {
        self.workspace.join(".corpsearch")
    }

    /// Validate the provider override, if any.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref provider) = self.provider {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }

        if let Some(ref model) = self.model {
            if model.trim().is_empty() {
                return Err(AppError::Config("Model name must not be empty".to_string()));
            }
        }

        Ok(())
    }
}
