//! pagesearch-embed
//!
//! Embedding providers for the semantic index. `HashingEmbedder` is fully
//! deterministic and needs no model files; `SentenceEmbedder` runs a
//! BERT-family sentence model (e.g. all-MiniLM-L6-v2) through candle.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pagesearch_core::config::{expand_path, EmbedderKind, SemanticConfig};
use pagesearch_core::traits::Embedder;

pub mod device;
pub mod hashing;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hashing::HashingEmbedder;
pub use model::SentenceEmbedder;
pub use pool::masked_mean_l2;

/// Builds the embedder selected in configuration.
pub fn embedder_from_config(config: &SemanticConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedder {
        EmbedderKind::Hashing => {
            tracing::info!(dim = config.hashing_dim, "using hashing embedder");
            Ok(Arc::new(HashingEmbedder::new(config.hashing_dim)))
        }
        EmbedderKind::Model => {
            let dir = resolve_model_dir(config.model_dir.as_deref())?;
            Ok(Arc::new(SentenceEmbedder::load(&dir, config.max_tokens)?))
        }
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { tracing::info!(dir = %p.display(), "using configured model dir"); return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { tracing::info!(dir = %p.display(), "using MODEL_DIR"); return Ok(p); } }
    let local = Path::new("models/all-MiniLM-L6-v2"); if local.exists() { return Ok(local.to_path_buf()); }
    Err(anyhow!("Could not locate a sentence embedding model directory; set semantic.model_dir"))
}
