
use async_trait::async_trait;

use super::{EmbeddingProvider, ProviderBatch, ProviderEmbedding, TokenUsage};
use crate::Result;
use crate::embeddings::truncation::estimate_token_count;

const LOCAL_MODEL: &str = "hash";
const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing embedder that needs no network
///
/// Each token and adjacent-token bigram is hashed into a signed bucket, and
/// the bucket counts are L2-normalized. Texts sharing vocabulary land close
/// together, which is enough to keep matching usable offline.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embeds synchronously; an input without tokens maps to the zero vector
    #[inline]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }

        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
        }

        crate::vector::normalize(&vector)
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = blake3::hash(feature);
        let bytes = hash.as_bytes();

        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

        vector[bucket] += sign * weight;
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    #[inline]
    fn name(&self) -> &str {
        "local"
    }

    #[inline]
    fn default_model(&self) -> &str {
        LOCAL_MODEL
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, text: &str, _model: &str) -> Result<ProviderEmbedding> {
        Ok(ProviderEmbedding {
            vector: self.embed_text(text),
            usage: TokenUsage::new(estimate_token_count(text)),
        })
    }

    async fn embed_batch(&self, texts: &[String], _model: &str) -> Result<ProviderBatch> {
        let mut usage = TokenUsage::default();
        let vectors = texts
            .iter()
            .map(|text| {
                usage += TokenUsage::new(estimate_token_count(text));
                self.embed_text(text)
            })
            .collect();

        Ok(ProviderBatch { vectors, usage })
    }
}
