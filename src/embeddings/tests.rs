use super::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn unreachable_ollama(fallback: FallbackPolicy) -> ProviderConfig {
    ProviderConfig {
        kind: ProviderKind::Ollama,
        fallback,
        host: "127.0.0.1".to_string(),
        port: 1,
        embedding_dimension: 16,
        request_timeout_secs: 2,
        retry_attempts: 1,
        ..ProviderConfig::default()
    }
}

async fn mock_ollama(vector: Vec<f32>) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "nomic-embed-text:latest"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [vector]
        })))
        .mount(&server)
        .await;

    server
}

fn config_for(server: &MockServer, dimension: u32) -> ProviderConfig {
    let address = server.address();
    ProviderConfig {
        kind: ProviderKind::Ollama,
        fallback: FallbackPolicy::None,
        host: address.ip().to_string(),
        port: address.port(),
        model: "nomic-embed-text".to_string(),
        embedding_dimension: dimension,
        ..ProviderConfig::default()
    }
}

#[test]
fn token_usage_accumulates() {
    let mut usage = TokenUsage::default();
    assert!(usage.is_zero());
    usage += TokenUsage::new(4);
    usage += TokenUsage::new(6);
    assert_eq!(usage.prompt_tokens, 10);
}

#[tokio::test]
async fn local_kind_needs_no_server() {
    let config = ProviderConfig {
        kind: ProviderKind::Local,
        embedding_dimension: 64,
        ..ProviderConfig::default()
    };
    let provider = build_provider(&config).await.expect("should build");
    assert_eq!(provider.name(), "local");
    assert_eq!(provider.dimension(), 64);
    assert_eq!(model_version(provider.as_ref()), "local:hash:fusion-v1");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_ollama_falls_back_to_local() {
    let provider = build_provider(&unreachable_ollama(FallbackPolicy::Local))
        .await
        .expect("should fall back");
    assert_eq!(provider.name(), "local");
    assert_eq!(provider.dimension(), 16);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_ollama_without_fallback_fails_fast() {
    let err = build_provider(&unreachable_ollama(FallbackPolicy::None))
        .await
        .err()
        .expect("should fail");
    assert!(matches!(err, MatchError::ProviderMisconfigured(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn healthy_ollama_is_selected() {
    let server = mock_ollama(vec![0.1, 0.2, 0.3]).await;
    let provider = build_provider(&config_for(&server, 3))
        .await
        .expect("should build");
    assert_eq!(provider.name(), "ollama");
    assert_eq!(
        model_version(provider.as_ref()),
        "ollama:nomic-embed-text:fusion-v1"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn dimension_disagreement_is_fatal_even_with_fallback() {
    let server = mock_ollama(vec![0.1, 0.2]).await;
    let config = ProviderConfig {
        fallback: FallbackPolicy::Local,
        ..config_for(&server, 3)
    };

    let err = build_provider(&config).await.err().expect("should fail");
    assert!(matches!(err, MatchError::ProviderMisconfigured(_)));
}
