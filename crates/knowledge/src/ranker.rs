//! Cosine similarity and top-k selection.

use crate::types::{DocId, Embedding};
use corpsearch_core::{AppError, AppResult};
use std::cmp::Ordering;
use std::sync::Arc;

/// A document id with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// Calculate cosine similarity between two vectors.
///
/// Accumulates in f64. Returns 0.0 when lengths differ or either vector has
/// zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_finite() {
        score as f32
    } else {
        0.0
    }
}

/// Best-first ordering: higher score first, then lower id.
fn best_first(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Rank indexed embeddings against a query vector and keep the best `k`.
///
/// Results are sorted by descending score, ties broken by ascending id.
/// Each document appears at most once; `k` larger than the index returns
/// everything.
///
/// # Errors
/// * `AppError::InvalidArgument` - If `k` is negative
pub fn rank(
    query: &[f32],
    indexed: &[(DocId, Arc<Embedding>)],
    k: i64,
) -> AppResult<Vec<ScoredDoc>> {
    if k < 0 {
        return Err(AppError::InvalidArgument(format!(
            "k must be non-negative, got {}",
            k
        )));
    }

    let k = usize::try_from(k).unwrap_or(usize::MAX);
    if k == 0 || indexed.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored: Vec<ScoredDoc> = indexed
        .iter()
        .map(|(doc_id, embedding)| ScoredDoc {
            doc_id: *doc_id,
            score: cosine_similarity(query, &embedding.vector),
        })
        .collect();

    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, best_first);
        scored.truncate(k);
    }
    scored.sort_by(best_first);

    tracing::debug!(
        "Ranked {} documents (requested top-{})",
        scored.len(),
        k
    );

    Ok(scored)
}
