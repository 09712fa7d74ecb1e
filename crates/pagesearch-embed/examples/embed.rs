use pagesearch_core::traits::Embedder;
use pagesearch_embed::HashingEmbedder;

fn main() -> anyhow::Result<()> {
    let embedder = HashingEmbedder::new(384);
    let texts = vec!["data protection".to_string(), "protected data".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    let cosine: f32 = embs[0].iter().zip(&embs[1]).map(|(a, b)| a * b).sum();
    println!("{} dim={} cosine={cosine:.3}", embedder.embedder_id(), embedder.dim());
    Ok(())
}
