//! Command handlers for the corpsearch CLI.
//!
//! This module organizes all CLI commands into separate submodules and holds
//! the start-up and output code they share.

pub mod add;
pub mod list;
pub mod search;
pub mod shell;
pub mod stats;

// Re-export command types for convenience
pub use add::AddCommand;
pub use list::ListCommand;
pub use search::SearchCommand;
pub use shell::ShellCommand;
pub use stats::StatsCommand;

use corpsearch_core::{config::AppConfig, AppResult};
use corpsearch_knowledge::{
    config as kb_config, load_or_default, Document, DocumentStore, EmbeddingEngine,
    IngestSource, SearchResult, SearchService,
};
use std::sync::Arc;

/// A ready search service plus the settings commands need.
pub struct Session {
    pub service: SearchService,
    pub default_top_k: i64,
}

/// Load configuration and documents, then start the search service.
///
/// A document file that fails to parse is reported on stderr and does not
/// stop start-up. A provider that fails to load does.
pub async fn open_session(config: &AppConfig) -> AppResult<Session> {
    let kb = kb_config::load_config(&config.workspace)?.with_app_overrides(config);
    kb.validate()?;

    let store = Arc::new(DocumentStore::new());
    let report = load_or_default(&store, kb.documents.as_deref()).await?;

    if let Some(error) = &report.error {
        eprintln!("Warning: {}", error);
    }
    match &report.source {
        IngestSource::File(path) => {
            tracing::info!("Loaded {} documents from {:?}", report.loaded.len(), path)
        }
        IngestSource::Defaults => {
            tracing::info!("Using {} built-in documents", report.loaded.len())
        }
        IngestSource::Unchanged => {}
    }

    let engine = EmbeddingEngine::global(kb.embedding.clone());
    let service = SearchService::start(store, engine).await?;

    Ok(Session {
        service,
        default_top_k: kb.default_top_k,
    })
}

/// Render search results for the terminal.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No matching documents found.\n".to_string();
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} [{}]\n   {}\n   match: {}%\n",
            i + 1,
            result.document.title,
            result.document.category,
            result.document.content,
            result.match_percent()
        ));
    }
    out
}

/// Render the document list for the terminal.
pub fn format_documents(documents: &[Arc<Document>]) -> String {
    let mut out = String::new();
    for doc in documents {
        out.push_str(&format!(
            "#{} {} [{}]\n   {}\n",
            doc.id, doc.title, doc.category, doc.content
        ));
    }
    out
}
