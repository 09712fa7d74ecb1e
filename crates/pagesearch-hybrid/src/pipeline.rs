//! Offline build: documents → extracted pages → passages → indexes.
//!
//! Extraction problems are recovered locally. A document whose text cannot
//! be read, or a single unreadable page, is skipped and counted in the
//! report. Index construction problems abort the build.

use std::collections::HashSet;

use chrono::Utc;

use pagesearch_core::traits::{Embedder, TextExtractor, UrlLocator};
use pagesearch_core::types::{Document, Passage};
use pagesearch_core::{Chunker, IndexBuildError, IngestionError, Settings};
use pagesearch_text::LexicalIndex;
use pagesearch_vector::SemanticIndex;

use crate::artifact::{BuildManifest, IndexArtifact, FORMAT_VERSION};

/// Ingestion outcome of one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub documents: usize,
    pub passages: usize,
    pub pages_read: usize,
    pub warnings: Vec<IngestionError>,
}

impl BuildReport {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

pub struct ArtifactBuilder<'a> {
    settings: &'a Settings,
    embedder: &'a dyn Embedder,
    locator: &'a dyn UrlLocator,
}

impl<'a> ArtifactBuilder<'a> {
    pub fn new(settings: &'a Settings, embedder: &'a dyn Embedder, locator: &'a dyn UrlLocator) -> Self {
        Self { settings, embedder, locator }
    }

    /// Builds a complete artifact. `prior_warnings` carries ingestion errors
    /// raised before extraction (e.g. while discovering the corpus) so they
    /// are reported and counted with the rest.
    pub fn build(
        &self,
        documents: &[Document],
        extractor: &dyn TextExtractor,
        prior_warnings: Vec<IngestionError>,
    ) -> Result<(IndexArtifact, BuildReport), IndexBuildError> {
        let chunker = Chunker::new(self.settings.chunking.clone());
        let mut report = BuildReport { warnings: prior_warnings, ..BuildReport::default() };
        let mut kept_documents: Vec<Document> = Vec::with_capacity(documents.len());
        let mut passages: Vec<Passage> = Vec::new();
        let mut seen_documents = HashSet::new();

        for document in documents {
            if !seen_documents.insert(document.id.as_str()) {
                return Err(IndexBuildError::DuplicateDocument(document.id.clone()));
            }
            let pages = match extractor.extract(document) {
                Ok(pages) => pages,
                Err(e) => {
                    tracing::warn!(doc = %document.id, error = %e, "skipping document");
                    report.warnings.push(e);
                    continue;
                }
            };
            for page in pages {
                if !document.contains_page(page.page_number) {
                    let e = IngestionError::PageOutOfRange {
                        doc_id: document.id.clone(),
                        page_number: page.page_number,
                        page_count: document.page_count,
                    };
                    tracing::warn!(error = %e, "skipping page");
                    report.warnings.push(e);
                    continue;
                }
                let text = match page.text {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping page");
                        report.warnings.push(e);
                        continue;
                    }
                };
                report.pages_read += 1;
                let url = self.locator.locate(document, page.page_number);
                for mut passage in chunker.chunk(&document.id, page.page_number, &text) {
                    passage.url = url.clone();
                    passages.push(passage);
                }
            }
            kept_documents.push(document.clone());
        }

        kept_documents.sort_by(|a, b| a.id.cmp(&b.id));
        passages.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(dup) = passages.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(IndexBuildError::DuplicatePassage(dup[0].id.clone()));
        }

        let lexical = LexicalIndex::build(&passages, &self.settings.lexical)?;
        let semantic = SemanticIndex::build(&passages, self.embedder, self.settings.semantic.batch_size)?;

        report.documents = kept_documents.len();
        report.passages = passages.len();
        tracing::info!(
            documents = report.documents,
            passages = report.passages,
            pages = report.pages_read,
            warnings = report.warning_count(),
            "artifact built"
        );

        let artifact = IndexArtifact {
            manifest: BuildManifest {
                format_version: FORMAT_VERSION,
                embedder_id: self.embedder.embedder_id().to_string(),
                dimension: self.embedder.dim(),
                built_at: Some(Utc::now()),
                document_count: kept_documents.len(),
                passage_count: passages.len(),
                warnings: report.warning_count(),
            },
            documents: kept_documents,
            passages,
            lexical,
            semantic,
        };
        Ok((artifact, report))
    }
}
