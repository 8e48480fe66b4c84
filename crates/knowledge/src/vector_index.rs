//! In-memory vector index kept in sync with the document store.
//!
//! Embeddings are computed lazily: each sync embeds only documents that have
//! no embedding yet or whose embedding was produced by a different model
//! version. Provider calls run without holding the map lock, and results are
//! committed in one write once every batch has succeeded.
//!
//! A sync runs in two steps. [`VectorIndex::prepare`] embeds pending
//! documents and returns a [`PreparedSync`] that holds the sync lock;
//! [`PreparedSync::commit`] publishes the embeddings. Dropping a prepared
//! sync without committing leaves the index untouched.

use crate::embeddings::EmbeddingEngine;
use crate::store::DocumentStore;
use crate::types::{DocId, Embedding, SyncRecord, SyncStats};
use chrono::Utc;
use corpsearch_core::AppResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Document id → embedding map with incremental sync.
#[derive(Debug, Default)]
pub struct VectorIndex {
    embeddings: RwLock<BTreeMap<DocId, Arc<Embedding>>>,
    sync_lock: Mutex<()>,
    last_sync: RwLock<Option<SyncRecord>>,
}

/// Embeddings computed by [`VectorIndex::prepare`] and not yet committed.
///
/// Other syncs wait until this value is committed or dropped.
#[derive(Debug)]
pub struct PreparedSync<'a> {
    index: &'a VectorIndex,
    _guard: MutexGuard<'a, ()>,
    fresh: Vec<Arc<Embedding>>,
    stats: SyncStats,
}

impl PreparedSync<'_> {
    /// Stats this sync will record once committed.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Current index contents merged with the uncommitted embeddings, in
    /// ascending id order.
    pub async fn candidates(&self) -> Vec<(DocId, Arc<Embedding>)> {
        let mut merged = self.index.embeddings.read().await.clone();
        for embedding in &self.fresh {
            merged.insert(embedding.doc_id, Arc::clone(embedding));
        }
        merged.into_iter().collect()
    }

    /// Publish the embeddings and record the sync.
    pub async fn commit(self) -> SyncStats {
        if !self.fresh.is_empty() {
            let mut embeddings = self.index.embeddings.write().await;
            for embedding in self.fresh {
                embeddings.insert(embedding.doc_id, embedding);
            }
        }

        *self.index.last_sync.write().await = Some(SyncRecord {
            at: Utc::now(),
            stats: self.stats.clone(),
        });

        self.stats
    }
}

impl VectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the index up to date with a snapshot of `store`.
    ///
    /// After success every document in the snapshot has exactly one
    /// embedding tagged with the engine's model version. On error nothing is
    /// committed.
    pub async fn sync(&self, store: &DocumentStore, engine: &EmbeddingEngine) -> AppResult<SyncStats> {
        let prepared = self.prepare(store, engine).await?;
        Ok(prepared.commit().await)
    }

    /// Embed every document of a `store` snapshot that is missing or stale,
    /// without publishing anything.
    pub async fn prepare<'a>(
        &'a self,
        store: &DocumentStore,
        engine: &EmbeddingEngine,
    ) -> AppResult<PreparedSync<'a>> {
        let guard = self.sync_lock.lock().await;

        let snapshot = store.list().await;
        let version = engine.model_version();

        let pending: Vec<_> = {
            let embeddings = self.embeddings.read().await;
            snapshot
                .iter()
                .filter(|doc| {
                    embeddings
                        .get(&doc.id)
                        .map_or(true, |e| e.model_version != version)
                })
                .cloned()
                .collect()
        };

        let mut stats = SyncStats {
            snapshot_size: snapshot.len(),
            embedded: pending.len(),
            reused: snapshot.len() - pending.len(),
            provider_calls: 0,
        };

        let mut fresh = Vec::with_capacity(pending.len());
        if !pending.is_empty() {
            tracing::info!(
                "Embedding {} documents ({} up to date) with {}",
                pending.len(),
                stats.reused,
                version
            );

            let texts: Vec<String> = pending.iter().map(|doc| doc.content.clone()).collect();
            let vectors = engine.encode_batch(&texts).await?;
            stats.provider_calls = texts.len().div_ceil(engine.config().batch_size.max(1));

            for (doc, vector) in pending.iter().zip(vectors) {
                fresh.push(Arc::new(Embedding {
                    doc_id: doc.id,
                    vector,
                    model_version: version.clone(),
                }));
            }
        } else {
            tracing::debug!("Index up to date ({} documents)", snapshot.len());
        }

        Ok(PreparedSync {
            index: self,
            _guard: guard,
            fresh,
            stats,
        })
    }

    /// Embedding for one document, if indexed.
    pub async fn get(&self, doc_id: DocId) -> Option<Arc<Embedding>> {
        self.embeddings.read().await.get(&doc_id).cloned()
    }

    /// Snapshot of all embeddings in ascending id order.
    pub async fn all(&self) -> Vec<(DocId, Arc<Embedding>)> {
        self.embeddings
            .read()
            .await
            .iter()
            .map(|(id, embedding)| (*id, Arc::clone(embedding)))
            .collect()
    }

    /// Number of indexed documents.
    pub async fn len(&self) -> usize {
        self.embeddings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.embeddings.read().await.is_empty()
    }

    /// Time and stats of the last successful sync.
    pub async fn last_sync(&self) -> Option<SyncRecord> {
        self.last_sync.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockProvider;
    use crate::embeddings::EmbeddingConfig;
    use corpsearch_core::AppError;

    fn engine(mock: Arc<MockProvider>, batch_size: usize) -> EmbeddingEngine {
        let config = EmbeddingConfig {
            batch_size,
            ..EmbeddingConfig::for_provider("mock")
        };
        EmbeddingEngine::from_provider(mock, config).unwrap()
    }

    async fn store_with(contents: &[&str]) -> DocumentStore {
        let store = DocumentStore::new();
        for (i, content) in contents.iter().enumerate() {
            store
                .append(format!("doc {}", i + 1), "General", *content)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_sync_embeds_every_document() {
        let store = store_with(&["alpha beta", "gamma delta", "epsilon"]).await;
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = engine(Arc::clone(&mock), 2);
        let index = VectorIndex::new();

        let stats = index.sync(&store, &engine).await.unwrap();

        assert_eq!(stats.snapshot_size, 3);
        assert_eq!(stats.embedded, 3);
        assert_eq!(stats.reused, 0);
        assert_eq!(stats.provider_calls, 2);
        assert_eq!(mock.batch_calls(), 2);

        let ids: Vec<DocId> = index.all().await.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(index.get(2).await.unwrap().model_version, "mock:mock-v1");
        assert_eq!(index.last_sync().await.unwrap().stats, stats);
    }

    #[tokio::test]
    async fn test_second_sync_makes_no_provider_calls() {
        let store = store_with(&["alpha", "beta"]).await;
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = engine(Arc::clone(&mock), 8);
        let index = VectorIndex::new();

        index.sync(&store, &engine).await.unwrap();
        let calls = mock.batch_calls();

        let stats = index.sync(&store, &engine).await.unwrap();
        assert_eq!(mock.batch_calls(), calls);
        assert_eq!(stats.embedded, 0);
        assert_eq!(stats.reused, 2);
        assert_eq!(stats.provider_calls, 0);
    }

    #[tokio::test]
    async fn test_sync_embeds_only_new_documents() {
        let store = store_with(&["alpha", "beta"]).await;
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = engine(Arc::clone(&mock), 8);
        let index = VectorIndex::new();

        index.sync(&store, &engine).await.unwrap();
        store.append("doc 3", "IT", "gamma").await.unwrap();

        let stats = index.sync(&store, &engine).await.unwrap();
        assert_eq!(stats.embedded, 1);
        assert_eq!(mock.texts_embedded(), 3);
        assert_eq!(index.len().await, 3);
    }

    #[tokio::test]
    async fn test_failed_sync_commits_nothing() {
        let store = store_with(&["fine one", "fine two", "boom", "fine three"]).await;
        let mock = Arc::new(MockProvider::new("mock-v1", 16).failing_on("boom"));
        let engine = engine(Arc::clone(&mock), 1);
        let index = VectorIndex::new();

        let result = index.sync(&store, &engine).await;

        assert!(matches!(result, Err(AppError::ProviderEncode(_))));
        assert!(mock.batch_calls() >= 3);
        assert!(index.is_empty().await);
        assert!(index.last_sync().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_prepare_commits_nothing() {
        let store = store_with(&["alpha", "beta"]).await;
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = engine(Arc::clone(&mock), 8);
        let index = VectorIndex::new();

        let prepared = index.prepare(&store, &engine).await.unwrap();
        assert_eq!(prepared.stats().embedded, 2);
        assert_eq!(prepared.candidates().await.len(), 2);
        drop(prepared);

        assert!(index.is_empty().await);
        assert!(index.last_sync().await.is_none());

        let stats = index.sync(&store, &engine).await.unwrap();
        assert_eq!(stats.embedded, 2);
        assert_eq!(index.len().await, 2);
    }

    #[tokio::test]
    async fn test_model_change_reembeds_everything() {
        let store = store_with(&["alpha", "beta"]).await;
        let index = VectorIndex::new();

        let old = Arc::new(MockProvider::new("mock-v1", 16));
        index.sync(&store, &engine(old, 8)).await.unwrap();

        let new = Arc::new(MockProvider::new("mock-v2", 16));
        let stats = index.sync(&store, &engine(Arc::clone(&new), 8)).await.unwrap();

        assert_eq!(stats.embedded, 2);
        assert_eq!(new.texts_embedded(), 2);
        assert_eq!(index.len().await, 2);
        for (_, embedding) in index.all().await {
            assert_eq!(embedding.model_version, "mock:mock-v2");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_syncs_embed_each_document_once() {
        let store = Arc::new(store_with(&["a1", "b2", "c3", "d4", "e5"]).await);
        let mock = Arc::new(MockProvider::new("mock-v1", 16));
        let engine = Arc::new(engine(Arc::clone(&mock), 2));
        let index = Arc::new(VectorIndex::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (store, engine, index) =
                    (Arc::clone(&store), Arc::clone(&engine), Arc::clone(&index));
                tokio::spawn(async move { index.sync(&store, &engine).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(mock.texts_embedded(), 5);
        assert_eq!(index.len().await, 5);
    }
}
