//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Store-assigned document identifier. Starts at 1 and is never reused.
pub type DocId = u64;

/// A knowledge-base document. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier assigned by the store
    pub id: DocId,

    /// Short human-readable title
    pub title: String,

    /// Open-ended category label (e.g. "HR", "IT")
    pub category: String,

    /// Body text; this is what gets embedded
    pub content: String,
}

/// A document that has not been appended yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub category: String,
    pub content: String,
}

impl NewDocument {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            content: content.into(),
        }
    }
}

/// Embedding of one document's content.
///
/// `model_version` ties the vector to the provider that produced it; a
/// different active version marks the embedding stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub doc_id: DocId,
    pub vector: Vec<f32>,
    pub model_version: String,
}

/// A ranked match returned by a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Cosine similarity in [-1, 1]
    pub score: f32,

    /// The matched document
    pub document: Arc<Document>,
}

impl SearchResult {
    /// Score as a whole percentage, truncated toward zero.
    pub fn match_percent(&self) -> i32 {
        (self.score * 100.0) as i32
    }
}

/// Outcome of one index sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Documents in the store snapshot that was synced
    pub snapshot_size: usize,

    /// Documents embedded during this sync (new or stale)
    pub embedded: usize,

    /// Documents that already had an up-to-date embedding
    pub reused: usize,

    /// Provider batch calls issued
    pub provider_calls: usize,
}

/// Record of the last successful sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    pub at: DateTime<Utc>,
    pub stats: SyncStats,
}

/// Statistics for a running search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Documents in the store
    pub documents: usize,

    /// Documents with an embedding in the index
    pub indexed: usize,

    /// Active provider model version
    pub model_version: String,

    /// Embedding dimensions of the active provider
    pub dimensions: usize,

    /// Last successful sync, if any
    pub last_sync: Option<SyncRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_score(score: f32) -> SearchResult {
        SearchResult {
            score,
            document: Arc::new(Document {
                id: 1,
                title: "t".to_string(),
                category: "HR".to_string(),
                content: "c".to_string(),
            }),
        }
    }

    #[test]
    fn test_match_percent_truncates() {
        assert_eq!(result_with_score(0.876).match_percent(), 87);
        assert_eq!(result_with_score(1.0).match_percent(), 100);
        assert_eq!(result_with_score(-0.25).match_percent(), -25);
    }

    #[test]
    fn test_search_result_serializes_document() {
        let json = serde_json::to_value(result_with_score(0.5)).unwrap();
        assert_eq!(json["document"]["category"], "HR");
        assert_eq!(json["score"], 0.5);
    }
}
