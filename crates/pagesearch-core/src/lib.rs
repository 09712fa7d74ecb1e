#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! pagesearch-core
//!
//! Domain types, the error taxonomy, capability traits, configuration and the
//! paragraph chunker shared by every other `pagesearch-*` crate.

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::Chunker;
pub use config::Settings;
pub use error::{ArtifactLoadError, Error, IndexBuildError, IngestionError, QueryError, Result};
pub use types::{Document, DocumentId, Passage, PassageId, SearchHit, SourceKind};
