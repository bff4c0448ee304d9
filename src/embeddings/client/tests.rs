use super::*;
use crate::embeddings::{HashEmbedder, ProviderBatch, ProviderEmbedding};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records every provider call and answers with a fixed-size vector
struct RecordingProvider {
    dimension: usize,
    returned_dimension: usize,
    max_batch: usize,
    delay: Duration,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingProvider {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            returned_dimension: dimension,
            max_batch: 64,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.returned_dimension];
        if let Some(first) = vector.first_mut() {
            *first = text.len() as f32;
        }
        vector
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .expect("lock should not be poisoned")
            .iter()
            .map(Vec::len)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch
    }

    async fn health_check(&self) -> crate::Result<()> {
        Ok(())
    }

    async fn embed(&self, text: &str, _model: &str) -> crate::Result<ProviderEmbedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.batches
            .lock()
            .expect("lock should not be poisoned")
            .push(vec![text.to_string()]);
        Ok(ProviderEmbedding {
            vector: self.vector_for(text),
            usage: TokenUsage::new(3),
        })
    }

    async fn embed_batch(&self, texts: &[String], _model: &str) -> crate::Result<ProviderBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.batches
            .lock()
            .expect("lock should not be poisoned")
            .push(texts.to_vec());
        Ok(ProviderBatch {
            vectors: texts.iter().map(|t| self.vector_for(t)).collect(),
            usage: TokenUsage::new(texts.len() * 3),
        })
    }
}

fn provider_config(dimension: u32) -> ProviderConfig {
    ProviderConfig {
        embedding_dimension: dimension,
        batch_size: 2,
        inter_batch_delay_ms: 0,
        max_input_tokens: 8,
        ..ProviderConfig::default()
    }
}

fn client_with(provider: Arc<RecordingProvider>) -> EmbeddingClient {
    let dimension = provider.dimension as u32;
    EmbeddingClient::new(provider, &provider_config(dimension), 16)
}

#[tokio::test]
async fn blank_text_is_a_zero_vector_without_a_call() {
    let provider = Arc::new(RecordingProvider::new(4));
    let client = client_with(Arc::clone(&provider));

    let outcome = client.embed("   ", None).await.expect("should embed");
    assert_eq!(outcome.vector.as_slice(), &[0.0; 4]);
    assert!(outcome.usage.is_zero());
    assert!(!outcome.cached);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_embed_is_served_from_cache() {
    let provider = Arc::new(RecordingProvider::new(4));
    let client = client_with(Arc::clone(&provider));

    let first = client.embed("Walnut bowls", None).await.expect("should embed");
    let second = client.embed("  walnut BOWLS ", None).await.expect("should embed");

    assert!(!first.cached);
    assert_eq!(first.usage.prompt_tokens, 3);
    assert!(second.cached);
    assert!(second.usage.is_zero());
    assert!(Arc::ptr_eq(&first.vector, &second.vector));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn models_have_separate_cache_entries() {
    let provider = Arc::new(RecordingProvider::new(4));
    let client = client_with(Arc::clone(&provider));

    client.embed("linen", Some("a")).await.expect("should embed");
    client.embed("linen", Some("b")).await.expect("should embed");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn long_text_is_truncated_before_sending() {
    let provider = Arc::new(RecordingProvider::new(4));
    let client = client_with(Arc::clone(&provider));

    let text = "one two three four five six seven eight nine ten eleven twelve";
    client.embed(text, None).await.expect("should embed");

    let batches = provider.batches.lock().expect("lock should not be poisoned");
    let sent = &batches[0][0];
    assert!(sent.len() < text.len());
    assert!(text.starts_with(sent.as_str()));
    assert!(!sent.ends_with(' '));
}

#[tokio::test]
async fn batch_sends_only_unique_misses_in_sub_batches() {
    let provider = Arc::new(RecordingProvider::new(4));
    let client = client_with(Arc::clone(&provider));

    client.embed("glass", None).await.expect("should embed");

    let texts: Vec<String> = ["glass", "oak", "", "OAK", "wool", "silver"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let outcome = client.embed_batch(&texts, None).await.expect("should embed");

    assert_eq!(outcome.vectors.len(), texts.len());
    assert_eq!(outcome.cache_hits, 1);
    assert_eq!(outcome.vectors[2].as_slice(), &[0.0; 4]);
    assert!(Arc::ptr_eq(&outcome.vectors[1], &outcome.vectors[3]));

    // One single call for "glass", then oak/wool and silver
    assert_eq!(provider.batch_sizes(), vec![1, 2, 1]);
    assert_eq!(outcome.usage.prompt_tokens, 9);

    let again = client.embed_batch(&texts, None).await.expect("should embed");
    assert_eq!(again.cache_hits, 5);
    assert!(again.usage.is_zero());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn batch_size_respects_provider_limit() {
    let provider = Arc::new(RecordingProvider {
        max_batch: 1,
        ..RecordingProvider::new(4)
    });
    let client = client_with(Arc::clone(&provider));

    let texts = vec!["a b c".to_string(), "d e f".to_string(), "g h i".to_string()];
    client.embed_batch(&texts, None).await.expect("should embed");
    assert_eq!(provider.batch_sizes(), vec![1, 1, 1]);
}

#[tokio::test]
async fn wrong_dimension_is_rejected_and_not_cached() {
    let provider = Arc::new(RecordingProvider {
        returned_dimension: 3,
        ..RecordingProvider::new(4)
    });
    let client = client_with(Arc::clone(&provider));

    let err = client.embed("felt", None).await.expect_err("should fail");
    assert!(matches!(
        err,
        MatchError::DimensionMismatch {
            expected: 4,
            actual: 3
        }
    ));
    assert_eq!(client.cache_stats().entries, 0);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let provider = Arc::new(RecordingProvider {
        delay: Duration::from_millis(200),
        ..RecordingProvider::new(4)
    });
    let client = client_with(Arc::clone(&provider)).with_timeout(Duration::from_millis(10));

    let err = client.embed("slow", None).await.expect_err("should time out");
    assert!(matches!(err, MatchError::Timeout { .. }));

    let texts = vec!["slow".to_string()];
    let err = client
        .embed_batch(&texts, None)
        .await
        .expect_err("should time out");
    assert!(matches!(err, MatchError::Timeout { .. }));
}

#[tokio::test]
async fn works_with_the_local_embedder() {
    let client = EmbeddingClient::new(
        Arc::new(HashEmbedder::new(32)),
        &provider_config(32),
        8,
    );

    let outcome = client.embed("hand thrown stoneware", None).await.expect("should embed");
    assert_eq!(outcome.vector.len(), 32);
    assert!((crate::vector::magnitude(&outcome.vector) - 1.0).abs() < 1e-5);
    assert_eq!(client.model_version(), "local:hash:fusion-v1");
}
