use crate::error::{IngestionError, QueryError};
use crate::types::{Document, SearchHit};

/// Text → fixed-length vector capability, injected into index builds and
/// the query path.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hashing:xxh64:d384`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Maximum token length for this provider.
    fn max_len(&self) -> usize;
    /// Compute embeddings for a batch of input texts, one vector per text.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// One page of extracted text. `text` is an error when that page alone
/// could not be decoded.
#[derive(Debug)]
pub struct ExtractedPage {
    pub page_number: u32,
    pub text: Result<String, IngestionError>,
}

/// PDF (or other) text extraction, treated as a black box.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<Vec<ExtractedPage>, IngestionError>;
}

/// Produces the page-addressable link stored with every passage.
pub trait UrlLocator: Send + Sync {
    fn locate(&self, document: &Document, page_number: u32) -> String;
}

impl<F> UrlLocator for F
where
    F: Fn(&Document, u32) -> String + Send + Sync,
{
    fn locate(&self, document: &Document, page_number: u32) -> String {
        self(document, page_number)
    }
}

/// Keyword side of hybrid retrieval.
pub trait LexicalScorer: Send + Sync {
    /// Every passage sharing at least one term with `query`, best first.
    fn score(&self, query: &str) -> Vec<SearchHit>;
}

/// Embedding side of hybrid retrieval.
pub trait VectorScorer: Send + Sync {
    fn dim(&self) -> usize;
    /// The `k` nearest passages to `query_vec`, best first.
    fn nearest(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>, QueryError>;
    /// Cosine similarity between one stored passage and `query_vec`.
    fn similarity(&self, passage_id: &str, query_vec: &[f32]) -> Option<f32>;
}
