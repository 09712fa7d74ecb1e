//! TF-IDF lexical index over passages.
//!
//! Each passage counts as one document for IDF. Weights follow the smoothed
//! form `idf(t) = ln((1 + n) / (1 + df(t))) + 1` and every passage vector is
//! L2-normalized, so a query score is a plain dot product (cosine).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use pagesearch_core::config::LexicalConfig;
use pagesearch_core::traits::LexicalScorer;
use pagesearch_core::types::{sort_hits, Passage, PassageId, SearchHit, SourceKind};
use pagesearch_core::IndexBuildError;

use crate::analyzer::Analyzer;

/// Sparse vector sorted by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub weights: Vec<f32>,
}

impl SparseVector {
    fn from_counts(counts: &BTreeMap<u32, u32>, idf: &[f32]) -> Self {
        let mut indices = Vec::with_capacity(counts.len());
        let mut weights = Vec::with_capacity(counts.len());
        for (&column, &tf) in counts {
            indices.push(column);
            weights.push(tf as f32 * idf.get(column as usize).copied().unwrap_or(0.0));
        }
        let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for w in &mut weights {
                *w /= norm;
            }
        }
        Self { indices, weights }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, column: u32) -> Option<f32> {
        self.indices.binary_search(&column).ok().and_then(|i| self.weights.get(i).copied())
    }
}

/// On-disk shape of the index; postings and the analyzer are derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLexicalIndex {
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
    stop_words: Vec<String>,
    passage_ids: Vec<PassageId>,
    vectors: Vec<SparseVector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredLexicalIndex", into = "StoredLexicalIndex")]
pub struct LexicalIndex {
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
    stop_words: Vec<String>,
    passage_ids: Vec<PassageId>,
    vectors: Vec<SparseVector>,
    /// column -> (passage ordinal, weight)
    postings: Vec<Vec<(u32, f32)>>,
    analyzer: Analyzer,
}

impl LexicalIndex {
    /// An index over no passages; every query returns nothing.
    pub fn empty(config: &LexicalConfig) -> Self {
        StoredLexicalIndex {
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            stop_words: config.stop_words.clone(),
            passage_ids: Vec::new(),
            vectors: Vec::new(),
        }
        .into()
    }

    pub fn build(passages: &[Passage], config: &LexicalConfig) -> Result<Self, IndexBuildError> {
        if config.max_vocabulary == Some(0) {
            return Err(IndexBuildError::Vocabulary("max_vocabulary must be positive".to_string()));
        }
        let analyzer = Analyzer::with_stop_words(&config.stop_words);
        let tokenized: Vec<Vec<String>> = passages.iter().map(|p| analyzer.terms(&p.text)).collect();

        let mut corpus_freq: HashMap<&str, u64> = HashMap::new();
        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        for terms in &tokenized {
            let mut seen = HashSet::new();
            for term in terms {
                *corpus_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut kept: Vec<(&str, u64)> = corpus_freq.into_iter().collect();
        if let Some(max) = config.max_vocabulary {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(max);
        }
        let mut terms: Vec<&str> = kept.into_iter().map(|(t, _)| t).collect();
        terms.sort_unstable();

        let n = passages.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(terms.len());
        for (column, term) in terms.iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            vocabulary.insert(term.to_string(), column as u32);
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
        }

        let vectors = tokenized
            .iter()
            .map(|terms| SparseVector::from_counts(&count_columns(&vocabulary, terms), &idf))
            .collect();

        tracing::info!(passages = passages.len(), vocabulary = vocabulary.len(), "built lexical index");
        Ok(StoredLexicalIndex {
            vocabulary,
            idf,
            stop_words: config.stop_words.clone(),
            passage_ids: passages.iter().map(|p| p.id.clone()).collect(),
            vectors,
        }
        .into())
    }

    /// Cosine similarity between `text` and every passage that shares at
    /// least one vocabulary term with it, best first.
    pub fn query(&self, text: &str) -> Vec<SearchHit> {
        let counts = count_columns(&self.vocabulary, &self.analyzer.terms(text));
        if counts.is_empty() {
            return Vec::new();
        }
        let query_vec = SparseVector::from_counts(&counts, &self.idf);
        let mut scores: HashMap<u32, f32> = HashMap::new();
        for (&column, &q_weight) in query_vec.indices.iter().zip(&query_vec.weights) {
            let Some(postings) = self.postings.get(column as usize) else { continue };
            for &(ordinal, weight) in postings {
                *scores.entry(ordinal).or_insert(0.0) += q_weight * weight;
            }
        }
        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .filter_map(|(ordinal, score)| {
                Some(SearchHit {
                    id: self.passage_ids.get(ordinal as usize)?.clone(),
                    score: score.min(1.0),
                    source: SourceKind::Lexical,
                })
            })
            .collect();
        sort_hits(&mut hits);
        hits
    }

    /// Checks the structural invariants a deserialized index must hold:
    /// one idf per vocabulary column, one vector per passage and every
    /// vector column inside the vocabulary.
    pub fn check_consistency(&self) -> Result<(), String> {
        let columns = self.idf.len();
        if self.vocabulary.len() != columns {
            return Err(format!("vocabulary has {} terms but idf has {columns} entries", self.vocabulary.len()));
        }
        if let Some((term, column)) = self.vocabulary.iter().find(|(_, &c)| c as usize >= columns) {
            return Err(format!("term '{term}' maps to column {column}, outside 0..{columns}"));
        }
        if self.vectors.len() != self.passage_ids.len() {
            return Err(format!(
                "lexical index has {} vectors for {} passages",
                self.vectors.len(),
                self.passage_ids.len()
            ));
        }
        for (id, vector) in self.passage_ids.iter().zip(&self.vectors) {
            if vector.indices.len() != vector.weights.len() {
                return Err(format!("lexical vector of '{id}' has mismatched indices and weights"));
            }
            if vector.indices.iter().any(|&c| c as usize >= columns) {
                return Err(format!("lexical vector of '{id}' refers to a column outside 0..{columns}"));
            }
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, u32> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).and_then(|&c| self.idf.get(c as usize).copied())
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn passage_ids(&self) -> &[PassageId] {
        &self.passage_ids
    }

    pub fn len(&self) -> usize {
        self.passage_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passage_ids.is_empty()
    }
}

fn count_columns(vocabulary: &BTreeMap<String, u32>, terms: &[String]) -> BTreeMap<u32, u32> {
    let mut counts = BTreeMap::new();
    for term in terms {
        if let Some(&column) = vocabulary.get(term) {
            *counts.entry(column).or_insert(0) += 1;
        }
    }
    counts
}

impl From<StoredLexicalIndex> for LexicalIndex {
    fn from(stored: StoredLexicalIndex) -> Self {
        let mut postings = vec![Vec::new(); stored.vocabulary.len()];
        for (ordinal, vector) in stored.vectors.iter().enumerate() {
            for (&column, &weight) in vector.indices.iter().zip(&vector.weights) {
                if let Some(list) = postings.get_mut(column as usize) {
                    list.push((ordinal as u32, weight));
                }
            }
        }
        Self {
            analyzer: Analyzer::with_stop_words(&stored.stop_words),
            vocabulary: stored.vocabulary,
            idf: stored.idf,
            stop_words: stored.stop_words,
            passage_ids: stored.passage_ids,
            vectors: stored.vectors,
            postings,
        }
    }
}

impl From<LexicalIndex> for StoredLexicalIndex {
    fn from(index: LexicalIndex) -> Self {
        Self {
            vocabulary: index.vocabulary,
            idf: index.idf,
            stop_words: index.stop_words,
            passage_ids: index.passage_ids,
            vectors: index.vectors,
        }
    }
}

impl PartialEq for LexicalIndex {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary == other.vocabulary
            && self.idf == other.idf
            && self.stop_words == other.stop_words
            && self.passage_ids == other.passage_ids
            && self.vectors == other.vectors
    }
}

impl LexicalScorer for LexicalIndex {
    fn score(&self, query: &str) -> Vec<SearchHit> {
        self.query(query)
    }
}
