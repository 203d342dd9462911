// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic search over the document index using cosine similarity

use serde::Serialize;

use crate::config::{SearchConfig, ThresholdOrder, DEFAULT_MIN_SCORE, DEFAULT_TOP_K};
use crate::embedding::{EmbeddingProvider, IndexEntry, IndexStore};
use crate::errors::{ContextoError, Result};

/// Ranking parameters for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of hits returned
    pub top_k: usize,
    /// Hits must score strictly above this value
    pub min_score: f32,
    pub threshold_order: ThresholdOrder,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            threshold_order: ThresholdOrder::default(),
        }
    }
}

impl SearchOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            top_k: config.top_k(),
            min_score: config.min_score(),
            threshold_order: config.threshold_order(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

/// A matching document and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub score: f32,
}

/// Cosine similarity of two vectors.
///
/// Zero-norm vectors and vectors of different lengths score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Score every entry against `query` and return the best hits.
///
/// Ties keep index order.
pub fn rank(entries: &[IndexEntry], query: &[f32], options: &SearchOptions) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = entries
        .iter()
        .map(|entry| {
            if entry.embedding.len() != query.len() {
                tracing::warn!(
                    "Embedding for {} has dimension {}, query has {}",
                    entry.path,
                    entry.embedding.len(),
                    query.len()
                );
            }
            SearchHit {
                path: entry.path.clone(),
                score: cosine_similarity(query, &entry.embedding),
            }
        })
        .collect();

    // Sort by score (descending); sort_by is stable
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let min_score = options.min_score;
    match options.threshold_order {
        ThresholdOrder::FilterThenTruncate => {
            hits.retain(|hit| hit.score > min_score);
            hits.truncate(options.top_k);
        }
        ThresholdOrder::TruncateThenFilter => {
            hits.truncate(options.top_k);
            hits.retain(|hit| hit.score > min_score);
        }
    }

    hits
}

/// Embed `query` and rank the persisted index against it.
///
/// An empty index returns no hits without invoking the provider.
pub fn search(
    store: &IndexStore,
    provider: &mut dyn EmbeddingProvider,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchHit>> {
    let entries = store.load()?;
    if entries.is_empty() {
        tracing::debug!("Index at {} is empty", store.path().display());
        return Ok(Vec::new());
    }

    let query_vec = provider.embed_one(query).map_err(ContextoError::Embedding)?;
    let hits = rank(&entries, &query_vec, options);
    tracing::debug!(
        "Query matched {} of {} document(s)",
        hits.len(),
        entries.len()
    );
    Ok(hits)
}
