#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance
// Run with: cargo test --test integration_ollama -- --ignored

use std::env;
use std::sync::Arc;
use std::time::Duration;

use artisan_match::config::{FallbackPolicy, ProviderConfig, ProviderKind};
use artisan_match::embeddings::ollama::OllamaClient;
use artisan_match::embeddings::{EmbeddingClient, EmbeddingProvider, build_provider};
use artisan_match::vector::cosine_similarity;
use tracing::info;

const TEST_MODEL: &str = "nomic-embed-text:latest";
const TEST_DIMENSION: u32 = 768;

fn provider_config() -> ProviderConfig {
    ProviderConfig {
        kind: ProviderKind::Ollama,
        fallback: FallbackPolicy::None,
        host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434),
        model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| TEST_MODEL.to_string()),
        embedding_dimension: TEST_DIMENSION,
        batch_size: 4,
        ..ProviderConfig::default()
    }
}

fn create_integration_test_client() -> OllamaClient {
    OllamaClient::new(&provider_config())
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();

    let client = create_integration_test_client();
    let result = client.check_server();
    assert!(result.is_ok(), "Health check should succeed: {:?}", result);

    let models = client.list_models().expect("should list models");
    info!("Found {} models", models.len());
    assert!(!models.is_empty(), "Should have at least one model available");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a local Ollama instance"]
async fn real_ollama_embeddings_have_the_model_dimension() {
    init_test_tracing();

    let client = create_integration_test_client();
    let model = client.default_model().to_string();
    let batch = client
        .embed_batch(
            &[
                "hand thrown stoneware bowls".to_string(),
                "forged iron garden gates".to_string(),
            ],
            &model,
        )
        .await
        .expect("should embed");

    assert_eq!(batch.vectors.len(), 2);
    for vector in &batch.vectors {
        assert_eq!(vector.len(), TEST_DIMENSION as usize);
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a local Ollama instance"]
async fn real_ollama_places_related_texts_closer() {
    init_test_tracing();

    let config = provider_config();
    let provider = build_provider(&config).await.expect("should pass startup checks");
    assert_eq!(provider.name(), "ollama");

    let client = EmbeddingClient::new(Arc::clone(&provider), &config, 64);
    let pottery = client
        .embed("ceramic bowls thrown on a wheel", None)
        .await
        .expect("should embed");
    let stoneware = client
        .embed("handmade stoneware pottery", None)
        .await
        .expect("should embed");
    let gates = client
        .embed("welded steel gates", None)
        .await
        .expect("should embed");

    let related = cosine_similarity(&pottery.vector, &stoneware.vector).expect("same dimension");
    let unrelated = cosine_similarity(&pottery.vector, &gates.vector).expect("same dimension");
    info!("related {related:.3}, unrelated {unrelated:.3}");
    assert!(related > unrelated);

    let again = client
        .embed("ceramic bowls thrown on a wheel", None)
        .await
        .expect("should embed");
    assert!(again.cached);
}
