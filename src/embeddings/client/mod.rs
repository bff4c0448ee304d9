#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::cache::EmbeddingCache;
use super::truncation::truncate_to_token_budget;
use super::{EmbeddingProvider, TokenUsage};
use crate::cache::CacheStats;
use crate::config::ProviderConfig;
use crate::{MatchError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOutcome {
    pub vector: Arc<Vec<f32>>,
    pub usage: TokenUsage,
    pub latency: Duration,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchEmbedOutcome {
    pub vectors: Vec<Arc<Vec<f32>>>,
    pub usage: TokenUsage,
    pub latency: Duration,
    pub cache_hits: usize,
}

/// Caching, truncating, rate-limited front end for an embedding provider
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    dimension: usize,
    max_input_tokens: usize,
    batch_size: usize,
    inter_batch_delay: Duration,
    timeout: Duration,
}

struct PendingText {
    key: String,
    text: String,
    positions: Vec<usize>,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        config: &ProviderConfig,
        cache_capacity: usize,
    ) -> Self {
        let batch_size = (config.batch_size as usize)
            .min(provider.max_batch_size())
            .max(1);

        Self {
            provider,
            cache: EmbeddingCache::new(cache_capacity),
            dimension: config.embedding_dimension as usize,
            max_input_tokens: config.max_input_tokens,
            batch_size,
            inter_batch_delay: Duration::from_millis(config.inter_batch_delay_ms),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Overrides the per-call provider deadline
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    #[inline]
    pub fn model_version(&self) -> String {
        super::model_version(self.provider.as_ref())
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    #[inline]
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn zero_vector(&self) -> Arc<Vec<f32>> {
        Arc::new(vec![0.0; self.dimension])
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(MatchError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if !crate::vector::is_valid_vector(vector) {
            return Err(MatchError::EmbeddingProvider {
                provider: self.provider.name().to_string(),
                message: "provider returned non-finite values".to_string(),
            });
        }
        Ok(())
    }

    /// Embeds one text
    ///
    /// Blank text yields the zero vector without contacting the provider.
    #[inline]
    pub async fn embed(&self, text: &str, model: Option<&str>) -> Result<EmbedOutcome> {
        let started = Instant::now();
        let model = model.unwrap_or_else(|| self.provider.default_model());
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Ok(EmbedOutcome {
                vector: self.zero_vector(),
                usage: TokenUsage::default(),
                latency: started.elapsed(),
                cached: false,
            });
        }

        let key = EmbeddingCache::key(model, trimmed);
        if let Some(vector) = self.cache.get_by_key(&key) {
            debug!("Embedding cache hit for {} chars", trimmed.len());
            return Ok(EmbedOutcome {
                vector,
                usage: TokenUsage::default(),
                latency: started.elapsed(),
                cached: true,
            });
        }

        let prepared = truncate_to_token_budget(trimmed, self.max_input_tokens);
        let embedding = tokio::time::timeout(self.timeout, self.provider.embed(prepared, model))
            .await
            .map_err(|_| MatchError::Timeout {
                operation: format!("embedding request to {}", self.provider.name()),
                elapsed: started.elapsed(),
            })??;

        self.check_vector(&embedding.vector)?;

        let vector = Arc::new(embedding.vector);
        self.cache.insert_by_key(key, Arc::clone(&vector));

        Ok(EmbedOutcome {
            vector,
            usage: embedding.usage,
            latency: started.elapsed(),
            cached: false,
        })
    }

    /// Embeds many texts, sending only cache misses to the provider
    ///
    /// Misses are de-duplicated and sent in provider-sized sub-batches with a
    /// pause between them. Each sub-batch is cached as soon as it returns, so
    /// a later failure keeps earlier work.
    #[inline]
    pub async fn embed_batch(
        &self,
        texts: &[String],
        model: Option<&str>,
    ) -> Result<BatchEmbedOutcome> {
        let started = Instant::now();
        let model = model.unwrap_or_else(|| self.provider.default_model());

        let mut slots: Vec<Option<Arc<Vec<f32>>>> = vec![None; texts.len()];
        let mut pending: Vec<PendingText> = Vec::new();
        let mut pending_by_key: HashMap<String, usize> = HashMap::new();
        let mut cache_hits = 0;

        for (position, text) in texts.iter().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                slots[position] = Some(self.zero_vector());
                continue;
            }

            let key = EmbeddingCache::key(model, trimmed);
            if let Some(vector) = self.cache.get_by_key(&key) {
                slots[position] = Some(vector);
                cache_hits += 1;
                continue;
            }

            match pending_by_key.get(&key) {
                Some(&index) => pending[index].positions.push(position),
                None => {
                    pending_by_key.insert(key.clone(), pending.len());
                    pending.push(PendingText {
                        key,
                        text: truncate_to_token_budget(trimmed, self.max_input_tokens)
                            .to_string(),
                        positions: vec![position],
                    });
                }
            }
        }

        debug!(
            "Batch of {} texts: {} cache hits, {} unique misses",
            texts.len(),
            cache_hits,
            pending.len()
        );

        let mut usage = TokenUsage::default();

        for (batch_index, chunk) in pending.chunks(self.batch_size).enumerate() {
            if batch_index > 0 && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }

            let inputs: Vec<String> = chunk.iter().map(|p| p.text.clone()).collect();
            let request = self.provider.embed_batch(&inputs, model);
            let batch = tokio::time::timeout(self.timeout, request)
                .await
                .map_err(|_| MatchError::Timeout {
                    operation: format!(
                        "embedding batch {} ({} texts) to {}",
                        batch_index + 1,
                        inputs.len(),
                        self.provider.name()
                    ),
                    elapsed: started.elapsed(),
                })??;

            if batch.vectors.len() != chunk.len() {
                return Err(MatchError::EmbeddingProvider {
                    provider: self.provider.name().to_string(),
                    message: format!(
                        "expected {} vectors, received {}",
                        chunk.len(),
                        batch.vectors.len()
                    ),
                });
            }

            for vector in &batch.vectors {
                self.check_vector(vector)?;
            }

            usage += batch.usage;
            for (text, vector) in chunk.iter().zip(batch.vectors) {
                let vector = Arc::new(vector);
                self.cache.insert_by_key(text.key.clone(), Arc::clone(&vector));
                for &position in &text.positions {
                    slots[position] = Some(Arc::clone(&vector));
                }
            }
        }

        let vectors = slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    MatchError::Other(anyhow::anyhow!("batch slot left unfilled"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BatchEmbedOutcome {
            vectors,
            usage,
            latency: started.elapsed(),
            cache_hits,
        })
    }
}
