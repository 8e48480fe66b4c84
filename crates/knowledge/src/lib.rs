//! Semantic search over a corporate knowledge base.
//!
//! Documents live in an append-only in-memory store. Each search syncs an
//! incremental vector index (only new or stale documents are embedded),
//! encodes the query with the same provider and ranks documents by cosine
//! similarity.

pub mod config;
pub mod embeddings;
pub mod ingest;
pub mod ranker;
pub mod service;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::KnowledgeBaseConfig;
pub use embeddings::{EmbeddingConfig, EmbeddingEngine, EmbeddingProvider};
pub use ingest::{load_or_default, IngestReport, IngestSource};
pub use service::SearchService;
pub use store::DocumentStore;
pub use types::{
    DocId, Document, Embedding, NewDocument, SearchResult, ServiceStats, SyncRecord, SyncStats,
};
pub use vector_index::VectorIndex;
