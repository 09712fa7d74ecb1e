//! pagesearch-hybrid
//!
//! Ties the lexical and semantic indexes together: the index artifact and
//! its build pipeline, the JSON artifact store, the hybrid ranker and the
//! `SearchService` that answers `search` and `health`.

pub mod artifact;
pub mod demo;
pub mod pipeline;
pub mod ranker;
pub mod response;
pub mod service;
pub mod store;

pub use artifact::{BuildManifest, IndexArtifact, FORMAT_VERSION};
pub use pipeline::{ArtifactBuilder, BuildReport};
pub use ranker::{fuse, HybridRanker, RankedPassage};
pub use response::{format_chat_reply, HealthReport, HealthStatus, ResultRecord, SearchRequest, SearchResponse};
pub use service::{ArtifactOrigin, SearchService, ServingState};
pub use store::{ArtifactStore, JsonArtifactStore};
