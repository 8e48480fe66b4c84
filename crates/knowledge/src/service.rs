//! Search service: store access, index sync and ranking as one operation.

use crate::embeddings::EmbeddingEngine;
use crate::ranker;
use crate::store::DocumentStore;
use crate::types::{DocId, Document, SearchResult, ServiceStats, SyncStats};
use crate::vector_index::VectorIndex;
use corpsearch_core::{AppError, AppResult};
use std::sync::Arc;

/// Semantic search over a document store.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct SearchService {
    store: Arc<DocumentStore>,
    engine: Arc<EmbeddingEngine>,
    index: VectorIndex,
}

impl SearchService {
    /// Initialise the embedding provider and return a ready service.
    ///
    /// # Errors
    /// * `AppError::ProviderInit` - The provider could not be loaded
    pub async fn start(store: Arc<DocumentStore>, engine: Arc<EmbeddingEngine>) -> AppResult<Self> {
        engine.provider().await?;

        tracing::info!(
            "Search service ready ({}, {} documents)",
            engine.model_version(),
            store.size().await
        );

        Ok(Self {
            store,
            engine,
            index: VectorIndex::new(),
        })
    }

    /// Find the `k` documents most similar to `query`.
    ///
    /// A blank query or `k == 0` yields no results and touches nothing.
    ///
    /// # Errors
    /// * `AppError::InvalidArgument` - If `k` is negative
    /// * `AppError::ProviderEncode` / `AppError::ProviderTimeout` - Embedding failed;
    ///   store and index keep their previous state
    pub async fn search(&self, query: &str, k: i64) -> AppResult<Vec<SearchResult>> {
        if k < 0 {
            return Err(AppError::InvalidArgument(format!(
                "k must be non-negative, got {}",
                k
            )));
        }

        if k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prepared = self.index.prepare(&self.store, &self.engine).await?;

        let candidates = prepared.candidates().await;
        if candidates.is_empty() {
            tracing::debug!("Index is empty, skipping query encoding");
            prepared.commit().await;
            return Ok(Vec::new());
        }

        // Dropping `prepared` on error keeps the index as it was.
        let query_vector = self.engine.encode(query).await?;
        prepared.commit().await;

        let ranked = ranker::rank(&query_vector, &candidates, k)?;

        let mut results = Vec::with_capacity(ranked.len());
        for scored in ranked {
            match self.store.get(scored.doc_id).await {
                Some(document) => results.push(SearchResult {
                    score: scored.score,
                    document,
                }),
                None => tracing::warn!("Indexed document {} missing from store", scored.doc_id),
            }
        }

        tracing::debug!("Search returned {} results", results.len());
        Ok(results)
    }

    /// Append a document to the store. It is embedded on the next search.
    pub async fn append(
        &self,
        title: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> AppResult<DocId> {
        self.store.append(title, category, content).await
    }

    /// All documents in id order.
    pub async fn list(&self) -> Vec<Arc<Document>> {
        self.store.list().await
    }

    /// Number of documents in the store.
    pub async fn size(&self) -> usize {
        self.store.size().await
    }

    /// Sync the index without searching.
    pub async fn warm_up(&self) -> AppResult<SyncStats> {
        self.index.sync(&self.store, &self.engine).await
    }

    /// Store, index and provider statistics.
    pub async fn stats(&self) -> ServiceStats {
        ServiceStats {
            documents: self.store.size().await,
            indexed: self.index.len().await,
            model_version: self.engine.model_version(),
            dimensions: self.engine.dimensions(),
            last_sync: self.index.last_sync().await,
        }
    }
}
