//! Trigram embedding provider using character trigram-based content-aware embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use corpsearch_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Words too common to discriminate between documents.
const STOP_WORDS: &[&str] = &[
    // English
    "the", "which", "are", "was", "were", "for", "and", "but", "with", "from", "this", "that",
    "have", "has", "had", "its", "their", "they", "them",
    // Russian
    "для", "как", "что", "это", "или", "при", "все", "его", "она", "они", "так", "уже",
    "когда", "если", "чем", "где", "кто", "под", "над", "без", "про",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and whole
/// words. Related word forms ("отпуск", "отпуска") share most of their
/// trigrams, which gives a rough morphological similarity without a model.
#[derive(Debug)]
pub struct TrigramProvider {
    model: String,
    dimensions: usize,
    normalize: bool,
    stop_words: HashSet<&'static str>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(model: &str, dimensions: usize, normalize: bool) -> Self {
        Self {
            model: model.to_string(),
            dimensions,
            normalize,
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Generate a trigram-based embedding for text.
    fn generate_trigram_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !self.stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let dim_idx = self.bucket(&trigram, 37);
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let base_dim = self.bucket(word, 31);
            embedding[base_dim] += *freq as f32;
        }

        if self.normalize {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        embedding
    }

    fn bucket(&self, token: &str, multiplier: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect())
    }
}
