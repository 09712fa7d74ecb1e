use std::sync::Arc;

use pagesearch_core::config::Fallback;
use pagesearch_core::traits::Embedder;
use pagesearch_core::Settings;
use pagesearch_embed::HashingEmbedder;
use pagesearch_hybrid::{format_chat_reply, JsonArtifactStore, SearchService};

/// Serves the built-in GDPR corpus and answers one query.
/// Usage: cargo run -p pagesearch-hybrid --example demo_search -- "GDPR rights"
fn main() {
    let query = std::env::args().nth(1).unwrap_or_else(|| "GDPR rights".to_string());
    let mut settings = Settings::default();
    settings.data.artifact_path = "/nonexistent/pagesearch-index.json".to_string();
    settings.data.fallback = Fallback::Demo;

    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(settings.semantic.hashing_dim));
    let service = SearchService::initialize(settings, embedder, Box::new(JsonArtifactStore));
    println!("health: {:?}", service.health());
    println!("{}", format_chat_reply(&service.search(&query, 3, true)));
}
