use pagesearch_core::config::SemanticConfig;
use pagesearch_core::traits::Embedder;
use pagesearch_embed::{embedder_from_config, HashingEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hashing_embedder_shapes_and_determinism() {
    let embedder = embedder_from_config(&SemanticConfig::default()).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "default hashing dim is 384");
    assert_eq!(embedder.embedder_id(), "hashing:xxh64:d384");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_and_word_forms_raise_similarity() {
    let e = HashingEmbedder::new(512);
    let base = e.embed_text("individual rights under GDPR");
    let related = e.embed_text("GDPR rights of individuals");
    let unrelated = e.embed_text("breach notification within 72 hours");
    assert!(cosine(&base, &related) > cosine(&base, &unrelated));

    let protection = e.embed_text("protection");
    let protected = e.embed_text("protected");
    assert!(cosine(&protection, &protected) > 0.2, "trigrams link inflected forms");
}

#[test]
fn empty_text_embeds_to_zero_vector() {
    let e = HashingEmbedder::new(16);
    assert!(e.embed_text("  ...  ").iter().all(|x| *x == 0.0));
}
