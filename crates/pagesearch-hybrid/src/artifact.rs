use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pagesearch_core::config::LexicalConfig;
use pagesearch_core::types::{Document, Passage};
use pagesearch_text::LexicalIndex;
use pagesearch_vector::SemanticIndex;

/// Bumped whenever the serialized layout of `IndexArtifact` changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub format_version: u32,
    pub embedder_id: String,
    pub dimension: usize,
    pub built_at: Option<DateTime<Utc>>,
    pub document_count: usize,
    pub passage_count: usize,
    /// Pages or documents skipped during ingestion.
    pub warnings: usize,
}

/// Everything a query needs, built offline and never mutated afterwards.
///
/// `documents` and `passages` are sorted by id; the lexical and semantic
/// indexes list passages in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub manifest: BuildManifest,
    pub documents: Vec<Document>,
    pub passages: Vec<Passage>,
    pub lexical: LexicalIndex,
    pub semantic: SemanticIndex,
}

impl IndexArtifact {
    pub fn empty(embedder_id: &str, dimension: usize, lexical: &LexicalConfig) -> Self {
        Self {
            manifest: BuildManifest {
                format_version: FORMAT_VERSION,
                embedder_id: embedder_id.to_string(),
                dimension,
                built_at: None,
                document_count: 0,
                passage_count: 0,
                warnings: 0,
            },
            documents: Vec::new(),
            passages: Vec::new(),
            lexical: LexicalIndex::empty(lexical),
            semantic: SemanticIndex::empty(embedder_id, dimension),
        }
    }

    pub fn passage(&self, id: &str) -> Option<&Passage> {
        self.passages
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.passages[i])
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents
            .binary_search_by(|d| d.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.documents[i])
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Checks the cross-references a freshly loaded artifact must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if !self.documents.windows(2).all(|w| w[0].id < w[1].id) {
            return Err("documents are not sorted by unique id".to_string());
        }
        if !self.passages.windows(2).all(|w| w[0].id < w[1].id) {
            return Err("passages are not sorted by unique id".to_string());
        }
        for passage in &self.passages {
            let document = self
                .document(&passage.doc_id)
                .ok_or_else(|| format!("passage '{}' refers to unknown document '{}'", passage.id, passage.doc_id))?;
            if !document.contains_page(passage.page_number) {
                return Err(format!(
                    "passage '{}' is on page {} but '{}' has {} pages",
                    passage.id, passage.page_number, document.id, document.page_count
                ));
            }
        }
        let ids = self.passages.iter().map(|p| &p.id);
        if !ids.clone().eq(self.lexical.passage_ids().iter()) {
            return Err("lexical index does not match the passage list".to_string());
        }
        if !ids.eq(self.semantic.passage_ids().iter()) {
            return Err("semantic index does not match the passage list".to_string());
        }
        if self.semantic.dimension() != self.manifest.dimension
            || self.semantic.embedder_id() != self.manifest.embedder_id
        {
            return Err("semantic index disagrees with the build manifest".to_string());
        }
        self.lexical.check_consistency()?;
        self.semantic.check_consistency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_artifact_is_valid() {
        let artifact = IndexArtifact::empty("hashing:xxh64:d8", 8, &LexicalConfig::default());
        assert!(artifact.is_empty());
        assert!(artifact.validate().is_ok());
        assert!(artifact.passage("missing").is_none());
    }

    #[test]
    fn validate_rejects_passage_outside_its_document() {
        let mut artifact = IndexArtifact::empty("e", 4, &LexicalConfig::default());
        artifact.documents.push(Document {
            id: "doc".to_string(),
            name: "doc.pdf".to_string(),
            locator: "doc.pdf".to_string(),
            page_count: 1,
        });
        artifact.passages.push(Passage {
            id: Passage::make_id("doc", 2, 0),
            doc_id: "doc".to_string(),
            page_number: 2,
            ordinal: 0,
            start: 0,
            end: 4,
            text: "text".to_string(),
            url: String::new(),
        });
        let err = artifact.validate().unwrap_err();
        assert!(err.contains("page 2"), "{err}");
    }
}
