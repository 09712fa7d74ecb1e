//! pagesearch-text
//!
//! Keyword side of retrieval: the shared tantivy-based analyzer, the TF-IDF
//! lexical index and the query-term highlighter.

pub mod analyzer;
pub mod highlight;
pub mod lexical;

pub use analyzer::Analyzer;
pub use highlight::Highlighter;
pub use lexical::{LexicalIndex, SparseVector};
