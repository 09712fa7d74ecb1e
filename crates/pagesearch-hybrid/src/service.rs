//! Process-wide serving state.
//!
//! The current artifact sits behind `RwLock<Arc<ServingState>>`. A query
//! clones the `Arc` and drops the lock before ranking, so queries never
//! wait on each other and a rebuild or reload only holds the write lock for
//! the pointer swap.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use pagesearch_core::config::Fallback;
use pagesearch_core::corpus::{FileUrlLocator, PagedTextExtractor};
use pagesearch_core::traits::{Embedder, TextExtractor, UrlLocator};
use pagesearch_core::types::Document;
use pagesearch_core::{ArtifactLoadError, Error, IngestionError, QueryError, Settings};
use pagesearch_text::Highlighter;

use crate::artifact::IndexArtifact;
use crate::demo::demo_artifact;
use crate::pipeline::{ArtifactBuilder, BuildReport};
use crate::ranker::HybridRanker;
use crate::response::{HealthReport, HealthStatus, ResultRecord, SearchRequest, SearchResponse};
use crate::store::ArtifactStore;

/// Where the artifact being served came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Loaded,
    Built,
    Empty,
    Demo,
}

#[derive(Debug)]
pub struct ServingState {
    pub artifact: IndexArtifact,
    pub origin: ArtifactOrigin,
}

pub struct SearchService {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    store: Box<dyn ArtifactStore>,
    highlighter: Highlighter,
    state: RwLock<Arc<ServingState>>,
    rebuild_failed: AtomicBool,
}

impl SearchService {
    /// A service serving an empty artifact until something is loaded or
    /// published.
    pub fn new(settings: Settings, embedder: Arc<dyn Embedder>, store: Box<dyn ArtifactStore>) -> Self {
        let empty = IndexArtifact::empty(embedder.embedder_id(), embedder.dim(), &settings.lexical);
        Self {
            highlighter: Highlighter::new(&settings.highlight),
            state: RwLock::new(Arc::new(ServingState { artifact: empty, origin: ArtifactOrigin::Empty })),
            rebuild_failed: AtomicBool::new(false),
            settings,
            embedder,
            store,
        }
    }

    /// Loads the stored artifact, falling back to the configured substitute
    /// when it is missing or unusable.
    pub fn initialize(settings: Settings, embedder: Arc<dyn Embedder>, store: Box<dyn ArtifactStore>) -> Self {
        let service = Self::new(settings, embedder, store);
        if let Err(e) = service.reload() {
            tracing::warn!(error = %e, "no usable index artifact");
            service.install_fallback();
        }
        service
    }

    fn install_fallback(&self) {
        if self.settings.data.fallback != Fallback::Demo {
            return;
        }
        match demo_artifact(&self.settings, self.embedder.as_ref()) {
            Ok(artifact) => {
                tracing::warn!(passages = artifact.passages.len(), "serving demo corpus");
                self.publish(artifact, ArtifactOrigin::Demo);
            }
            Err(e) => tracing::error!(error = %e, "failed to build demo corpus"),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.settings.artifact_path()
    }

    /// Reads the artifact from the configured path and swaps it in. On
    /// failure the current artifact stays in place.
    pub fn reload(&self) -> Result<(), ArtifactLoadError> {
        let artifact = self.store.load(&self.artifact_path())?;
        if artifact.manifest.embedder_id != self.embedder.embedder_id() {
            return Err(ArtifactLoadError::EmbedderMismatch {
                expected: self.embedder.embedder_id().to_string(),
                found: artifact.manifest.embedder_id,
            });
        }
        self.publish(artifact, ArtifactOrigin::Loaded);
        Ok(())
    }

    /// Atomically replaces the served artifact.
    pub fn publish(&self, artifact: IndexArtifact, origin: ArtifactOrigin) {
        let next = Arc::new(ServingState { artifact, origin });
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        drop(guard);
        self.rebuild_failed.store(false, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Arc<ServingState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Builds a new artifact, persists it and swaps it in. If any step
    /// fails the previous artifact keeps serving and health turns degraded.
    pub fn rebuild(
        &self,
        documents: &[Document],
        extractor: &dyn TextExtractor,
        locator: &dyn UrlLocator,
        prior_warnings: Vec<IngestionError>,
    ) -> Result<BuildReport, Error> {
        let builder = ArtifactBuilder::new(&self.settings, self.embedder.as_ref(), locator);
        let outcome = builder
            .build(documents, extractor, prior_warnings)
            .and_then(|(artifact, report)| {
                self.store.save(&artifact, &self.artifact_path())?;
                Ok((artifact, report))
            });
        match outcome {
            Ok((artifact, report)) => {
                self.publish(artifact, ArtifactOrigin::Built);
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "rebuild failed; keeping the previous artifact");
                self.rebuild_failed.store(true, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Rebuilds from the configured corpus directory of pre-extracted text.
    pub fn rebuild_from_corpus(&self) -> Result<BuildReport, Error> {
        let extractor = PagedTextExtractor::new(self.settings.corpus_dir());
        let locator = FileUrlLocator::new(self.settings.links.base_url.clone());
        let (documents, discovery_errors) = extractor.discover();
        tracing::info!(root = %extractor.root().display(), documents = documents.len(), "discovered corpus");
        self.rebuild(&documents, &extractor, &locator, discovery_errors)
    }

    pub fn health(&self) -> HealthReport {
        let state = self.snapshot();
        let status = if state.artifact.is_empty() {
            HealthStatus::Empty
        } else if state.origin == ArtifactOrigin::Demo || self.rebuild_failed.load(Ordering::SeqCst) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ready
        };
        HealthReport {
            status,
            passage_count: state.artifact.passages.len(),
            document_count: state.artifact.documents.len(),
        }
    }

    /// Answers a query. Failures are reported in the response, never
    /// returned or raised.
    pub fn search(&self, query: &str, max_results: usize, include_highlights: bool) -> SearchResponse {
        match self.try_search(query, max_results, include_highlights) {
            Ok(results) => SearchResponse::found(query, results),
            Err(e) => {
                tracing::warn!(error = %e, query, "search failed");
                SearchResponse::failed(query, format!("Search failed: {e}"))
            }
        }
    }

    pub fn search_request(&self, request: &SearchRequest) -> SearchResponse {
        self.search(&request.query, request.max_results, request.include_highlights)
    }

    /// Validates a raw JSON request body and runs it.
    pub fn handle_json(&self, body: &Value) -> SearchResponse {
        match SearchRequest::from_json(body, &self.settings.search) {
            Ok(request) => self.search_request(&request),
            Err(e) => {
                let query = body.get("query").and_then(Value::as_str).unwrap_or_default();
                SearchResponse::failed(query, e.to_string())
            }
        }
    }

    fn try_search(&self, query: &str, max_results: usize, include_highlights: bool) -> Result<Vec<ResultRecord>, QueryError> {
        if max_results == 0 {
            return Err(QueryError::InvalidField { field: "max_results", reason: "must be at least 1".to_string() });
        }
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let max_results = max_results.min(self.settings.search.max_results_cap);

        let state = self.snapshot();
        let artifact = &state.artifact;
        let ranker = HybridRanker::new(&artifact.lexical, &artifact.semantic, self.embedder.as_ref(), &self.settings.search);
        let ranked = ranker.search(query, max_results, self.settings.search.hybrid_weight)?;

        let mut records = Vec::with_capacity(ranked.len());
        for hit in ranked {
            let Some(passage) = artifact.passage(&hit.id) else {
                tracing::warn!(id = %hit.id, "ranked passage missing from artifact");
                continue;
            };
            let file_name = artifact.document(&passage.doc_id).map_or_else(|| passage.doc_id.clone(), |d| d.name.clone());
            records.push(ResultRecord {
                file_name,
                page_number: passage.page_number,
                text: passage.text.clone(),
                highlighted_text: include_highlights.then(|| self.highlighter.highlight(&passage.text, query)),
                url: passage.url.clone(),
                relevance_score: hit.fused_score,
            });
        }
        tracing::debug!(query, results = records.len(), "search complete");
        Ok(records)
    }
}
