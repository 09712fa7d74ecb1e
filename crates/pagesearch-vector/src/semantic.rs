use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pagesearch_core::traits::{Embedder, VectorScorer};
use pagesearch_core::types::{sort_hits, Passage, PassageId, SearchHit, SourceKind};
use pagesearch_core::{IndexBuildError, QueryError};

/// Cosine similarity of two equal-length vectors. Zero when either side has
/// no magnitude.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(&x, &y)| x * y).sum();
    let mag_a = l2_norm(a);
    let mag_b = l2_norm(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSemanticIndex {
    embedder_id: String,
    dimension: usize,
    passage_ids: Vec<PassageId>,
    vectors: Vec<Vec<f32>>,
}

/// One unit-length embedding per passage, in the same order as the passages
/// it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredSemanticIndex", into = "StoredSemanticIndex")]
pub struct SemanticIndex {
    embedder_id: String,
    dimension: usize,
    passage_ids: Vec<PassageId>,
    vectors: Vec<Vec<f32>>,
    positions: HashMap<PassageId, usize>,
}

impl SemanticIndex {
    pub fn empty(embedder_id: &str, dimension: usize) -> Self {
        StoredSemanticIndex {
            embedder_id: embedder_id.to_string(),
            dimension,
            passage_ids: Vec::new(),
            vectors: Vec::new(),
        }
        .into()
    }

    /// Embeds every passage in batches of `batch_size`.
    ///
    /// Fails if the embedder errors, returns the wrong number of vectors for
    /// a batch, or returns a vector of the wrong size or with NaN/inf values.
    /// Zero vectors are kept; they never match anything.
    pub fn build(passages: &[Passage], embedder: &dyn Embedder, batch_size: usize) -> Result<Self, IndexBuildError> {
        let dimension = embedder.dim();
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(passages.len());

        let pb = ProgressBar::new(passages.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} passages ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        for batch in passages.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            let embedded = embedder
                .embed_batch(&texts)
                .map_err(|e| IndexBuildError::Embedding(e.to_string()))?;
            if embedded.len() != batch.len() {
                return Err(IndexBuildError::BatchSize { expected: batch.len(), actual: embedded.len() });
            }
            for (passage, mut vector) in batch.iter().zip(embedded) {
                if vector.len() != dimension {
                    return Err(IndexBuildError::DimensionMismatch {
                        passage_id: passage.id.clone(),
                        expected: dimension,
                        actual: vector.len(),
                    });
                }
                if vector.iter().any(|x| !x.is_finite()) {
                    return Err(IndexBuildError::NonFinite(passage.id.clone()));
                }
                normalize(&mut vector);
                vectors.push(vector);
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        tracing::info!(passages = passages.len(), dimension, embedder = embedder.embedder_id(), "built semantic index");

        Ok(StoredSemanticIndex {
            embedder_id: embedder.embedder_id().to_string(),
            dimension,
            passage_ids: passages.iter().map(|p| p.id.clone()).collect(),
            vectors,
        }
        .into())
    }

    /// The `k` passages closest to `query_vec`, best first, ties by id.
    #[instrument(skip(self, query_vec), fields(passages = self.passage_ids.len()))]
    pub fn query(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>, QueryError> {
        if query_vec.len() != self.dimension {
            return Err(QueryError::DimensionMismatch { expected: self.dimension, actual: query_vec.len() });
        }
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }
        let norm = l2_norm(query_vec);
        if norm == 0.0 || !norm.is_finite() {
            return Ok(Vec::new());
        }
        let mut hits: Vec<SearchHit> = self
            .vectors
            .iter()
            .zip(&self.passage_ids)
            .map(|(v, id)| SearchHit {
                id: id.clone(),
                score: dot(v, query_vec) / norm,
                source: SourceKind::Semantic,
            })
            .collect();
        sort_hits(&mut hits);
        hits.truncate(k);
        Ok(hits)
    }

    /// Cosine similarity between a stored passage and `query_vec`.
    pub fn similarity(&self, passage_id: &str, query_vec: &[f32]) -> Option<f32> {
        if query_vec.len() != self.dimension {
            return None;
        }
        let position = *self.positions.get(passage_id)?;
        let norm = l2_norm(query_vec);
        if norm == 0.0 {
            return Some(0.0);
        }
        Some(dot(self.vectors.get(position)?, query_vec) / norm)
    }

    /// One vector per passage, each exactly `dimension` long and finite.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.vectors.len() != self.passage_ids.len() {
            return Err(format!(
                "semantic index has {} vectors for {} passages",
                self.vectors.len(),
                self.passage_ids.len()
            ));
        }
        for (id, vector) in self.passage_ids.iter().zip(&self.vectors) {
            if vector.len() != self.dimension {
                return Err(format!(
                    "semantic vector of '{id}' has {} components, expected {}",
                    vector.len(),
                    self.dimension
                ));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(format!("semantic vector of '{id}' is not finite"));
            }
        }
        Ok(())
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn passage_ids(&self) -> &[PassageId] {
        &self.passage_ids
    }

    pub fn vector(&self, passage_id: &str) -> Option<&[f32]> {
        self.positions.get(passage_id).and_then(|&i| self.vectors.get(i)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.passage_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passage_ids.is_empty()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

impl From<StoredSemanticIndex> for SemanticIndex {
    fn from(stored: StoredSemanticIndex) -> Self {
        let positions = stored.passage_ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        Self {
            embedder_id: stored.embedder_id,
            dimension: stored.dimension,
            passage_ids: stored.passage_ids,
            vectors: stored.vectors,
            positions,
        }
    }
}

impl From<SemanticIndex> for StoredSemanticIndex {
    fn from(index: SemanticIndex) -> Self {
        Self {
            embedder_id: index.embedder_id,
            dimension: index.dimension,
            passage_ids: index.passage_ids,
            vectors: index.vectors,
        }
    }
}

impl PartialEq for SemanticIndex {
    fn eq(&self, other: &Self) -> bool {
        self.embedder_id == other.embedder_id
            && self.dimension == other.dimension
            && self.passage_ids == other.passage_ids
            && self.vectors == other.vectors
    }
}

impl VectorScorer for SemanticIndex {
    fn dim(&self) -> usize {
        self.dimension
    }

    fn nearest(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>, QueryError> {
        self.query(query_vec, k)
    }

    fn similarity(&self, passage_id: &str, query_vec: &[f32]) -> Option<f32> {
        SemanticIndex::similarity(self, passage_id, query_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!((cosine(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut v = vec![0.0f32; 3];
        normalize(&mut v);
        assert_eq!(v, vec![0.0; 3]);
        let mut w = vec![3.0f32, 4.0];
        normalize(&mut w);
        assert!((w[0] - 0.6).abs() < 1e-6 && (w[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn check_consistency_flags_short_vectors() {
        let stored = serde_json::json!({
            "embedder_id": "e",
            "dimension": 2,
            "passage_ids": ["a", "b"],
            "vectors": [[1.0, 0.0], [1.0]],
        });
        let index: SemanticIndex = serde_json::from_value(stored).unwrap();
        assert!(index.check_consistency().unwrap_err().contains("'b'"));
        assert_eq!(index.similarity("b", &[1.0, 0.0]), Some(1.0));

        let missing = serde_json::json!({
            "embedder_id": "e",
            "dimension": 2,
            "passage_ids": ["a", "b"],
            "vectors": [[1.0, 0.0]],
        });
        let index: SemanticIndex = serde_json::from_value(missing).unwrap();
        assert!(index.check_consistency().is_err());
        assert_eq!(index.similarity("b", &[1.0, 0.0]), None);
        assert!(index.vector("b").is_none());
    }
}
