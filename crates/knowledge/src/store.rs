//! Append-only document store.
//!
//! Documents get monotonically increasing ids starting at 1. Appends are
//! serialized by the write lock, so ids are unique and gap-free. Readers get
//! snapshots of `Arc<Document>` and never block a writer for longer than the
//! clone takes.

use crate::types::{DocId, Document, NewDocument};
use corpsearch_core::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory, append-only collection of documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<Vec<Arc<Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document and return its id.
    ///
    /// Fails with `InvalidDocument` when `content` is blank; the store is
    /// left unchanged in that case.
    pub async fn append(
        &self,
        title: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> AppResult<DocId> {
        let doc = NewDocument::new(title, category, content);
        validate(&doc)?;

        let mut documents = self.documents.write().await;
        let id = next_id(&documents);
        documents.push(Arc::new(Document {
            id,
            title: doc.title,
            category: doc.category,
            content: doc.content,
        }));

        tracing::debug!("Appended document {} ({} total)", id, documents.len());
        Ok(id)
    }

    /// Append several documents as one step.
    ///
    /// Every record is validated before anything is written, so either all
    /// of them land with consecutive ids or none do.
    pub async fn append_many(&self, docs: Vec<NewDocument>) -> AppResult<Vec<DocId>> {
        for (position, doc) in docs.iter().enumerate() {
            validate(doc).map_err(|e| match e {
                AppError::InvalidDocument(msg) => {
                    AppError::InvalidDocument(format!("record {}: {}", position + 1, msg))
                }
                other => other,
            })?;
        }

        let mut documents = self.documents.write().await;
        let first = next_id(&documents);
        let mut ids = Vec::with_capacity(docs.len());

        for (offset, doc) in docs.into_iter().enumerate() {
            let id = first + offset as DocId;
            documents.push(Arc::new(Document {
                id,
                title: doc.title,
                category: doc.category,
                content: doc.content,
            }));
            ids.push(id);
        }

        tracing::debug!("Appended {} documents ({} total)", ids.len(), documents.len());
        Ok(ids)
    }

    /// All documents in insertion order.
    pub async fn list(&self) -> Vec<Arc<Document>> {
        self.documents.read().await.clone()
    }

    /// Number of documents.
    pub async fn size(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Look up a document by id.
    pub async fn get(&self, id: DocId) -> Option<Arc<Document>> {
        // Ids are dense and start at 1, so the id doubles as a position.
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.documents.read().await.get(index).cloned()
    }
}

fn next_id(documents: &[Arc<Document>]) -> DocId {
    documents.len() as DocId + 1
}

fn validate(doc: &NewDocument) -> AppResult<()> {
    if doc.content.trim().is_empty() {
        return Err(AppError::InvalidDocument(format!(
            "document '{}' has empty content",
            doc.title
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_append_assigns_sequential_ids() {
        let store = DocumentStore::new();
        let first = store.append("VPN", "IT", "Use OpenVPN").await.unwrap();
        let second = store.append("Mail", "IT", "Use port 993").await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.size().await, 2);
    }

    #[tokio::test]
    async fn test_append_then_list_contains_document_once() {
        let store = DocumentStore::new();
        store.append("A", "HR", "first").await.unwrap();
        let id = store.append("B", "HR", "second").await.unwrap();

        let docs = store.list().await;
        let matching: Vec<_> = docs.iter().filter(|d| d.id == id).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].content, "second");
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_append_rejects_blank_content() {
        let store = DocumentStore::new();
        let result = store.append("Empty", "HR", "   ").await;

        assert!(matches!(result, Err(AppError::InvalidDocument(_))));
        assert_eq!(store.size().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_append_does_not_consume_id() {
        let store = DocumentStore::new();
        store.append("A", "HR", "a").await.unwrap();
        assert!(store.append("B", "HR", "").await.is_err());
        let id = store.append("C", "HR", "c").await.unwrap();
        assert_eq!(id, 2);
    }

    #[tokio::test]
    async fn test_category_is_open_ended() {
        let store = DocumentStore::new();
        let id = store
            .append("Пропуск", "Безопасность", "Звоните в охрану")
            .await
            .unwrap();
        assert_eq!(store.get(id).await.unwrap().category, "Безопасность");
    }

    #[tokio::test]
    async fn test_append_many_is_all_or_nothing() {
        let store = DocumentStore::new();
        store.append("Existing", "HR", "kept").await.unwrap();

        let batch = vec![
            NewDocument::new("ok", "IT", "fine"),
            NewDocument::new("bad", "IT", ""),
        ];
        let result = store.append_many(batch).await;

        match result {
            Err(AppError::InvalidDocument(msg)) => assert!(msg.contains("record 2")),
            other => panic!("expected InvalidDocument, got {:?}", other),
        }
        assert_eq!(store.size().await, 1);

        let ids = store
            .append_many(vec![
                NewDocument::new("x", "IT", "x"),
                NewDocument::new("y", "IT", "y"),
            ])
            .await
            .unwrap();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_get_out_of_range() {
        let store = DocumentStore::new();
        store.append("A", "HR", "a").await.unwrap();
        assert!(store.get(0).await.is_none());
        assert!(store.get(2).await.is_none());
        assert_eq!(store.get(1).await.unwrap().title, "A");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_gap_free() {
        let store = Arc::new(DocumentStore::new());
        let mut handles = Vec::new();

        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append(format!("doc {}", i), "General", format!("content {}", i))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), 50);
        assert_eq!(ids, (1..=50).collect::<HashSet<DocId>>());
    }
}
