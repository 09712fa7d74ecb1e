use std::collections::BTreeMap;

use pagesearch_core::config::SearchConfig;
use pagesearch_core::traits::{Embedder, LexicalScorer, VectorScorer};
use pagesearch_core::types::PassageId;
use pagesearch_core::QueryError;

/// One fused result. `lexical_score` and `semantic_score` are the raw
/// cosines; `fused_score` is in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPassage {
    pub id: PassageId,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub fused_score: f32,
}

/// `weight * semantic + (1 - weight) * lexical` over normalized scores.
pub fn fuse(semantic_norm: f32, lexical_norm: f32, weight: f32) -> f32 {
    (weight * semantic_norm + (1.0 - weight) * lexical_norm).clamp(0.0, 1.0)
}

/// Divides by the distribution maximum. Negative scores clamp to 0; an
/// all-non-positive distribution normalizes to 0 everywhere.
fn normalized(score: f32, max: f32) -> f32 {
    if max > 0.0 {
        (score.max(0.0) / max).min(1.0)
    } else {
        0.0
    }
}

#[derive(Default, Clone, Copy)]
struct Candidate {
    lexical: f32,
    semantic: f32,
}

pub struct HybridRanker<'a, L, V>
where
    L: LexicalScorer,
    V: VectorScorer,
{
    lexical: &'a L,
    semantic: &'a V,
    embedder: &'a dyn Embedder,
    config: &'a SearchConfig,
}

impl<'a, L, V> HybridRanker<'a, L, V>
where
    L: LexicalScorer,
    V: VectorScorer,
{
    pub fn new(lexical: &'a L, semantic: &'a V, embedder: &'a dyn Embedder, config: &'a SearchConfig) -> Self {
        Self { lexical, semantic, embedder, config }
    }

    pub fn search(&self, query: &str, max_results: usize, weight: f32) -> Result<Vec<RankedPassage>, QueryError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(QueryError::InvalidField { field: "hybrid_weight", reason: format!("{weight} is outside [0, 1]") });
        }
        if query.trim().is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }

        // Without a usable query vector every semantic score is 0 and the
        // ranking is lexical.
        let query_vec = match self.embedder.embed_one(query) {
            Ok(v) if v.len() == self.semantic.dim() => Some(v),
            Ok(v) => {
                tracing::warn!(
                    expected = self.semantic.dim(),
                    actual = v.len(),
                    "query embedding has wrong dimension, ranking lexically"
                );
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed, ranking lexically");
                None
            }
        };
        let semantic_hits = match &query_vec {
            Some(v) => self.semantic.nearest(v, self.config.candidate_count(max_results))?,
            None => Vec::new(),
        };
        let lexical_hits = self.lexical.score(query);

        let mut candidates: BTreeMap<PassageId, Candidate> = BTreeMap::new();
        for hit in &semantic_hits {
            candidates.entry(hit.id.clone()).or_default().semantic = hit.score;
        }
        for hit in &lexical_hits {
            let semantic = query_vec.as_deref().and_then(|v| self.semantic.similarity(&hit.id, v));
            let entry = candidates.entry(hit.id.clone()).or_insert_with(|| Candidate {
                lexical: 0.0,
                semantic: semantic.unwrap_or(0.0),
            });
            entry.lexical = hit.score;
        }

        let max_semantic = candidates.values().map(|c| c.semantic).fold(0.0f32, f32::max);
        let max_lexical = candidates.values().map(|c| c.lexical).fold(0.0f32, f32::max);

        let mut ranked: Vec<RankedPassage> = candidates
            .into_iter()
            .map(|(id, c)| RankedPassage {
                id,
                lexical_score: c.lexical,
                semantic_score: c.semantic,
                fused_score: fuse(normalized(c.semantic, max_semantic), normalized(c.lexical, max_lexical), weight),
            })
            .filter(|r| r.fused_score > 0.0 && r.fused_score >= self.config.min_score)
            .collect();
        ranked.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(max_results);

        tracing::debug!(
            semantic_candidates = semantic_hits.len(),
            lexical_candidates = lexical_hits.len(),
            returned = ranked.len(),
            "hybrid search"
        );
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesearch_core::types::{SearchHit, SourceKind};

    #[test]
    fn fuse_weights_the_two_sides() {
        assert!((fuse(1.0, 0.0, 0.7) - 0.7).abs() < 1e-6);
        assert!((fuse(0.0, 1.0, 0.7) - 0.3).abs() < 1e-6);
        assert_eq!(fuse(0.4, 0.9, 1.0), 0.4);
        assert_eq!(fuse(0.4, 0.9, 0.0), 0.9);
        assert!(fuse(1.0, 1.0, 0.7) <= 1.0);
    }

    #[test]
    fn normalization_clamps_and_handles_empty_maxima() {
        assert_eq!(normalized(0.5, 1.0), 0.5);
        assert_eq!(normalized(-0.3, 0.6), 0.0);
        assert_eq!(normalized(0.2, 0.0), 0.0);
        assert_eq!(normalized(0.25, 0.5), 0.5);
    }

    struct FixedLexical(Vec<(&'static str, f32)>);

    impl LexicalScorer for FixedLexical {
        fn score(&self, _query: &str) -> Vec<SearchHit> {
            self.0
                .iter()
                .map(|(id, s)| SearchHit { id: id.to_string(), score: *s, source: SourceKind::Lexical })
                .collect()
        }
    }

    struct FixedVectors(Vec<(&'static str, f32)>);

    impl VectorScorer for FixedVectors {
        fn dim(&self) -> usize {
            1
        }
        fn nearest(&self, _query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>, QueryError> {
            let mut hits: Vec<SearchHit> = self
                .0
                .iter()
                .map(|(id, s)| SearchHit { id: id.to_string(), score: *s, source: SourceKind::Semantic })
                .collect();
            pagesearch_core::types::sort_hits(&mut hits);
            hits.truncate(k);
            Ok(hits)
        }
        fn similarity(&self, passage_id: &str, _query_vec: &[f32]) -> Option<f32> {
            self.0.iter().find(|(id, _)| *id == passage_id).map(|(_, s)| *s)
        }
    }

    struct UnitEmbedder;

    impl Embedder for UnitEmbedder {
        fn embedder_id(&self) -> &str {
            "unit"
        }
        fn dim(&self) -> usize {
            1
        }
        fn max_len(&self) -> usize {
            usize::MAX
        }
        fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    fn ids(ranked: &[RankedPassage]) -> Vec<&str> {
        ranked.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn lexical_only_candidates_get_exact_semantic_scores() {
        let lexical = FixedLexical(vec![("z", 0.8)]);
        let vectors = FixedVectors(vec![("a", 0.9), ("b", 0.5), ("c", 0.4), ("d", 0.3), ("z", 0.6)]);
        let config = SearchConfig { candidate_multiplier: 1, ..SearchConfig::default() };
        let ranker = HybridRanker::new(&lexical, &vectors, &UnitEmbedder, &config);
        let ranked = ranker.search("q", 1, 0.7).unwrap();
        // z: 0.7 * 0.6/0.9 + 0.3 * 1.0 = 0.7667 > a: 0.7
        assert_eq!(ids(&ranked), vec!["z"]);
        assert!((ranked[0].semantic_score - 0.6).abs() < 1e-6);
        assert!((ranked[0].fused_score - (0.7 * 0.6 / 0.9 + 0.3)).abs() < 1e-5);
    }

    #[test]
    fn zero_fused_scores_and_low_scores_are_dropped() {
        let lexical = FixedLexical(vec![]);
        let vectors = FixedVectors(vec![("a", 0.8), ("b", -0.2), ("c", 0.2)]);
        let config = SearchConfig::default();
        let ranker = HybridRanker::new(&lexical, &vectors, &UnitEmbedder, &config);
        assert_eq!(ids(&ranker.search("q", 10, 0.7).unwrap()), vec!["a", "c"]);
        assert!(ranker.search("q", 10, 0.0).unwrap().is_empty());

        let strict = SearchConfig { min_score: 0.5, ..SearchConfig::default() };
        let ranker = HybridRanker::new(&lexical, &vectors, &UnitEmbedder, &strict);
        assert_eq!(ids(&ranker.search("q", 10, 1.0).unwrap()), vec!["a"]);
    }

    #[test]
    fn equal_scores_order_by_id() {
        let lexical = FixedLexical(vec![("m", 0.5), ("b", 0.5)]);
        let vectors = FixedVectors(vec![("m", 0.5), ("b", 0.5)]);
        let config = SearchConfig::default();
        let ranker = HybridRanker::new(&lexical, &vectors, &UnitEmbedder, &config);
        assert_eq!(ids(&ranker.search("q", 5, 0.7).unwrap()), vec!["b", "m"]);
    }

    #[test]
    fn blank_query_and_bad_weight() {
        let lexical = FixedLexical(vec![("a", 1.0)]);
        let vectors = FixedVectors(vec![("a", 1.0)]);
        let config = SearchConfig::default();
        let ranker = HybridRanker::new(&lexical, &vectors, &UnitEmbedder, &config);
        assert!(ranker.search("   ", 5, 0.7).unwrap().is_empty());
        assert!(matches!(ranker.search("a", 5, 1.5), Err(QueryError::InvalidField { field: "hybrid_weight", .. })));
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embedder_id(&self) -> &str {
            "failing"
        }
        fn dim(&self) -> usize {
            1
        }
        fn max_len(&self) -> usize {
            usize::MAX
        }
        fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("model unavailable")
        }
    }

    struct WideEmbedder;

    impl Embedder for WideEmbedder {
        fn embedder_id(&self) -> &str {
            "wide"
        }
        fn dim(&self) -> usize {
            3
        }
        fn max_len(&self) -> usize {
            usize::MAX
        }
        fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    #[test]
    fn unusable_query_embedding_falls_back_to_lexical_order() {
        let lexical = FixedLexical(vec![("b", 0.9), ("c", 0.4), ("a", 0.2)]);
        let vectors = FixedVectors(vec![("a", 0.95), ("d", 0.8)]);
        let config = SearchConfig::default();
        let embedders: [&dyn Embedder; 2] = [&FailingEmbedder, &WideEmbedder];
        for embedder in embedders {
            let ranker = HybridRanker::new(&lexical, &vectors, embedder, &config);
            let ranked = ranker.search("q", 10, 0.7).unwrap();
            assert_eq!(ids(&ranked), vec!["b", "c", "a"], "{}", embedder.embedder_id());
            assert!(ranked.iter().all(|r| r.semantic_score == 0.0));
            assert!((ranked[0].fused_score - 0.3).abs() < 1e-6);
        }
    }
}
