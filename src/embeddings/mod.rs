// Embeddings module
// Text-to-vector providers, the caching embedding client and input truncation

pub mod cache;
pub mod client;
pub mod local;
pub mod ollama;
pub mod truncation;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{FallbackPolicy, ProviderConfig, ProviderKind};
use crate::{MatchError, Result};

pub use cache::EmbeddingCache;
pub use client::{BatchEmbedOutcome, EmbedOutcome, EmbeddingClient};
pub use local::HashEmbedder;
pub use ollama::OllamaClient;
pub use truncation::{estimate_token_count, truncate_to_token_budget};

/// Dimension of nomic-embed-text, the default Ollama embedding model
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;

const DIMENSION_PROBE_TEXT: &str = "artisan dimension probe";

/// Tokens billed by the provider for a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
}

impl TokenUsage {
    #[inline]
    pub fn new(prompt_tokens: usize) -> Self {
        Self { prompt_tokens }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.prompt_tokens == 0
    }
}

impl std::ops::AddAssign for TokenUsage {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEmbedding {
    pub vector: Vec<f32>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBatch {
    pub vectors: Vec<Vec<f32>>,
    pub usage: TokenUsage,
}

/// A text-embedding backend
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier used in model version tags
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    fn dimension(&self) -> usize;

    fn max_batch_size(&self) -> usize;

    async fn health_check(&self) -> Result<()>;

    async fn embed(&self, text: &str, model: &str) -> Result<ProviderEmbedding>;

    /// Returns one vector per input, in input order
    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<ProviderBatch>;
}

/// Selects the provider strategy once, at startup
///
/// The configured primary must pass its health check and report the
/// configured dimension. An unreachable primary is replaced by the local
/// embedder when the fallback policy allows it. A dimension disagreement is
/// always fatal.
#[inline]
pub async fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let dimension = config.embedding_dimension as usize;

    match config.kind {
        ProviderKind::Local => {
            info!("Using local hashing embedder ({} dimensions)", dimension);
            Ok(Arc::new(HashEmbedder::new(dimension)))
        }
        ProviderKind::Ollama => {
            let client = OllamaClient::new(config).map_err(|e| {
                MatchError::ProviderMisconfigured(format!("invalid Ollama settings: {e:#}"))
            })?;

            match probe(&client, dimension).await {
                Ok(()) => {
                    info!(
                        "Using Ollama provider with model {} ({} dimensions)",
                        client.default_model(),
                        dimension
                    );
                    Ok(Arc::new(client))
                }
                Err(e @ MatchError::DimensionMismatch { .. }) => {
                    Err(MatchError::ProviderMisconfigured(format!(
                        "model {} does not produce {}-dimensional vectors: {}",
                        client.default_model(),
                        dimension,
                        e
                    )))
                }
                Err(e) => match config.fallback {
                    FallbackPolicy::Local => {
                        warn!(
                            "Ollama provider unavailable ({}), falling back to local embedder",
                            e
                        );
                        Ok(Arc::new(HashEmbedder::new(dimension)))
                    }
                    FallbackPolicy::None => Err(MatchError::ProviderMisconfigured(format!(
                        "Ollama provider failed startup checks: {e}"
                    ))),
                },
            }
        }
    }
}

async fn probe(provider: &dyn EmbeddingProvider, dimension: usize) -> Result<()> {
    provider.health_check().await?;

    let probe = provider
        .embed(DIMENSION_PROBE_TEXT, provider.default_model())
        .await?;

    if probe.vector.len() != dimension {
        return Err(MatchError::DimensionMismatch {
            expected: dimension,
            actual: probe.vector.len(),
        });
    }
    Ok(())
}

/// Version tag recorded next to every stored composite vector
#[inline]
pub fn model_version(provider: &dyn EmbeddingProvider) -> String {
    format!(
        "{}:{}:fusion-v1",
        provider.name(),
        provider.default_model()
    )
}
