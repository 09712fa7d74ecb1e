//! Domain types used by the lexical and semantic indexes and the ranker.

use serde::{Deserialize, Serialize};
use std::ops::Range;

pub type DocumentId = String;
pub type PassageId = String;

/// A source document registered at ingestion time.
///
/// - `id`: stable identity (relative path without extension)
/// - `name`: display name shown to users, usually the PDF file name
/// - `locator`: path or URL of the original file
/// - `page_count`: total pages reported by extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub locator: String,
    pub page_count: u32,
}

impl Document {
    pub fn contains_page(&self, page_number: u32) -> bool {
        (1..=self.page_count).contains(&page_number)
    }
}

/// A paragraph of one page of one document; the unit of retrieval.
///
/// `start..end` is the byte range of `text` inside the page text it was cut
/// from, so `&page_text[passage.span()] == passage.text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: PassageId,
    pub doc_id: DocumentId,
    pub page_number: u32,
    pub ordinal: u32,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub url: String,
}

impl Passage {
    /// Builds the canonical passage id. Zero padding keeps lexicographic order
    /// equal to (document, page, position) order.
    pub fn make_id(doc_id: &str, page_number: u32, ordinal: u32) -> PassageId {
        format!("{doc_id}:{page_number:05}:{ordinal:04}")
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Indicates which index produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Semantic,
    Lexical,
}

/// The minimal surface returned by both indexes.
///
/// `id` matches `Passage::id`. `score` is a cosine similarity, higher is
/// better. `source` labels the origin index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PassageId,
    pub score: f32,
    pub source: SourceKind,
}

/// Orders hits by score descending, then passage id ascending.
pub fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}
