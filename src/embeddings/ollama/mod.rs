
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{EmbeddingProvider, ProviderBatch, ProviderEmbedding, TokenUsage};
use crate::MatchError;
use crate::config::ProviderConfig;

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
const PROVIDER_NAME: &str = "ollama";

/// Blocking Ollama HTTP client, exposed to async callers through `spawn_blocking`
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    batch_size: u32,
    dimension: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
    pub details: Option<ModelDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ModelDetails {
    pub format: Option<String>,
    pub family: Option<String>,
    pub families: Option<Vec<String>>,
    pub parameter_size: Option<String>,
    pub quantization_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = config
            .provider_url()
            .context("Failed to generate Ollama URL from config")?;

        let agent = Self::build_agent(Duration::from_secs(config.request_timeout_secs));

        Ok(Self {
            base_url,
            model: config.model.clone(),
            batch_size: config.batch_size,
            dimension: config.embedding_dimension as usize,
            agent,
            retry_attempts: config.retry_attempts.max(1),
            backoff_base_ms: 1000,
        })
    }

    fn build_agent(timeout: Duration) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(true)
            .build()
            .into()
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = Self::build_agent(timeout);
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Base delay between retries, doubled on every attempt
    #[inline]
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Test connection to Ollama server and verify model availability
    #[inline]
    pub fn check_server(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        let models = self.list_models().context("Server ping failed")?;
        self.validate_model(&models)
            .context("Model validation failed")?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    fn validate_model(&self, models: &[ModelInfo]) -> Result<()> {
        debug!("Validating model: {}", self.model);

        if models.iter().any(|m| same_model(&m.name, &self.model)) {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(anyhow::anyhow!(
                "Model '{}' is not available. Available models: {:?}",
                self.model,
                available_models
            ))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .get(url.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to fetch models")?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Embed texts with the `/api/embed` endpoint, split into configured batches
    #[inline]
    pub fn generate_embeddings(&self, texts: &[String], model: &str) -> Result<ProviderBatch> {
        if texts.is_empty() {
            return Ok(ProviderBatch {
                vectors: Vec::new(),
                usage: TokenUsage::default(),
            });
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        let mut usage = TokenUsage::default();

        for chunk in texts.chunks(self.batch_size.max(1) as usize) {
            let batch = self
                .generate_single_batch(chunk, model)
                .with_context(|| format!("Failed to process batch of {} texts", chunk.len()))?;
            usage += batch.usage;
            vectors.extend(batch.vectors);
        }

        debug!("Generated {} embeddings total", vectors.len());
        Ok(ProviderBatch { vectors, usage })
    }

    fn generate_single_batch(&self, texts: &[String], model: &str) -> Result<ProviderBatch> {
        let request = EmbedRequest {
            model,
            input: texts,
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate embeddings")?;

        let response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        if response.embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            ));
        }

        let tokens = response.prompt_eval_count.unwrap_or_else(|| {
            texts
                .iter()
                .map(|t| crate::embeddings::truncation::estimate_token_count(t))
                .sum()
        });

        Ok(ProviderBatch {
            vectors: response.embeddings,
            usage: TokenUsage::new(tokens),
        })
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms =
                            EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * self.backoff_base_ms;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }

    async fn run_blocking<T, F>(&self, f: F) -> crate::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(OllamaClient) -> Result<T> + Send + 'static,
    {
        let client = self.clone();
        tokio::task::spawn_blocking(move || f(client))
            .await
            .map_err(|e| provider_error(&anyhow::anyhow!("embedding task failed: {e}")))?
            .map_err(|e| provider_error(&e))
    }
}

/// Ollama reports untagged models as `name:latest`
fn same_model(available: &str, wanted: &str) -> bool {
    let strip = |name: &str| name.strip_suffix(":latest").unwrap_or(name).to_string();
    available == wanted || strip(available) == strip(wanted)
}

fn provider_error(e: &anyhow::Error) -> MatchError {
    MatchError::EmbeddingProvider {
        provider: PROVIDER_NAME.to_string(),
        message: format!("{e:#}"),
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    #[inline]
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[inline]
    fn default_model(&self) -> &str {
        &self.model
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn max_batch_size(&self) -> usize {
        self.batch_size as usize
    }

    async fn health_check(&self) -> crate::Result<()> {
        self.run_blocking(|client| client.check_server()).await
    }

    async fn embed(&self, text: &str, model: &str) -> crate::Result<ProviderEmbedding> {
        let texts = vec![text.to_string()];
        let model = model.to_string();
        let batch = self
            .run_blocking(move |client| client.generate_embeddings(&texts, &model))
            .await?;

        let usage = batch.usage;
        let vector = batch.vectors.into_iter().next().ok_or_else(|| {
            provider_error(&anyhow::anyhow!("provider returned no embedding"))
        })?;

        Ok(ProviderEmbedding { vector, usage })
    }

    async fn embed_batch(&self, texts: &[String], model: &str) -> crate::Result<ProviderBatch> {
        let texts = texts.to_vec();
        let model = model.to_string();
        self.run_blocking(move |client| client.generate_embeddings(&texts, &model))
            .await
    }
}
