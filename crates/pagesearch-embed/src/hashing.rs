use anyhow::Result;
use std::hash::Hasher;
use twox_hash::XxHash64;

use pagesearch_core::traits::Embedder;

const WORD_SEED: u64 = 0;
const TRIGRAM_SEED: u64 = 0x5eed;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder: lower-cased words and their character trigrams
/// are hashed into `dim` signed buckets, then the vector is L2-normalized.
/// Shared words dominate the similarity; shared trigrams let inflected forms
/// ("protection" / "protected") land near each other.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hashing:xxh64:d{dim}") }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.add_feature(&mut v, word.as_bytes(), WORD_SEED, 1.0);
            let chars: Vec<char> = word.chars().collect();
            if chars.len() > 3 {
                for gram in chars.windows(3) {
                    let gram: String = gram.iter().collect();
                    self.add_feature(&mut v, gram.as_bytes(), TRIGRAM_SEED, TRIGRAM_WEIGHT);
                }
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], bytes: &[u8], seed: u64, weight: f32) {
        let mut hasher = XxHash64::with_seed(seed);
        hasher.write(bytes);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
