//! pagesearch-vector
//!
//! Embedding side of retrieval. Passage vectors are stored L2-normalized
//! and searched with an exact cosine scan, which keeps results reproducible
//! for corpora of a few hundred thousand passages.

pub mod semantic;

pub use semantic::{cosine, SemanticIndex};
