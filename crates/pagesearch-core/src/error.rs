use std::path::PathBuf;
use thiserror::Error;

/// A document or page could not be extracted. The build skips the affected
/// unit and counts a warning.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("page {page_number} of '{doc_id}' is not valid text: {reason}")]
    UnreadablePage { doc_id: String, page_number: u32, reason: String },

    #[error("page {page_number} of '{doc_id}' is outside 1..={page_count}")]
    PageOutOfRange { doc_id: String, page_number: u32, page_count: u32 },

    #[error("no pages registered for document '{0}'")]
    UnknownDocument(String),
}

/// Building the vocabulary or the embeddings failed. Nothing is published.
#[derive(Debug, Error)]
pub enum IndexBuildError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedder returned {actual} vectors for a batch of {expected}")]
    BatchSize { expected: usize, actual: usize },

    #[error("embedding for passage '{passage_id}' has dimension {actual}, expected {expected}")]
    DimensionMismatch { passage_id: String, expected: usize, actual: usize },

    #[error("embedding for passage '{0}' contains non-finite values")]
    NonFinite(String),

    #[error("invalid vocabulary settings: {0}")]
    Vocabulary(String),

    #[error("duplicate passage id '{0}'")]
    DuplicatePassage(String),

    #[error("duplicate document id '{0}'")]
    DuplicateDocument(String),

    #[error("failed to write artifact to {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// The stored artifact is missing or unusable. Callers substitute an empty
/// or demo artifact.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found at {0}")]
    Missing(PathBuf),

    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("artifact {path} has format version {found}, expected {expected}")]
    Incompatible { path: PathBuf, found: u32, expected: u32 },

    #[error("artifact was built with embedder '{found}', but '{expected}' is configured")]
    EmbedderMismatch { expected: String, found: String },
}

/// A query was rejected before or during ranking.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Build(#[from] IndexBuildError),

    #[error(transparent)]
    Load(#[from] ArtifactLoadError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

pub type Result<T> = std::result::Result<T, Error>;
