//! Provider behaviour against mocked HTTP backends.
//!
//! Both providers are exercised through `Arc<dyn EmbeddingProvider>` to check
//! that callers see the same contract regardless of the configured backend.

use std::sync::Arc;

use compahunt_embeddings::{
    EmbeddingConfig, EmbeddingError, EmbeddingProvider, EmbeddingProviderType, EmbeddingRequest,
    LocalModelProvider, OpenAIProvider, SimilarityService, build_provider_with_key,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_single(server: &MockServer, text: &str, mode: &str, embedding: Vec<f64>) {
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_json(json!({"text": text, "type": mode})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dimension": embedding.len(),
            "embedding": embedding,
        })))
        .mount(server)
        .await;
}

async fn local_server() -> MockServer {
    let server = MockServer::start().await;
    mount_single(&server, "backend engineer", "passage", vec![0.6, 0.8, 0.0]).await;
    mount_single(&server, "pastry chef", "passage", vec![0.0, 0.0, 1.0]).await;
    mount_single(&server, "rust developer", "query", vec![0.8, 0.6, 0.0]).await;

    Mock::given(method("POST"))
        .and(path("/embed/batch"))
        .and(body_json(json!({
            "texts": ["passage: backend engineer", "passage: pastry chef"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.6, 0.8, 0.0], [0.0, 0.0, 1.0]],
            "count": 2,
            "dimension": 3
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/embed/batch"))
        .and(body_json(json!({
            "texts": ["passage: pastry chef", "passage: backend engineer"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.0, 0.0, 1.0], [0.6, 0.8, 0.0]],
            "count": 2,
            "dimension": 3
        })))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_empty_batch_makes_no_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let providers: Vec<Arc<dyn EmbeddingProvider>> = vec![
        Arc::new(LocalModelProvider::new(server.uri())),
        Arc::new(OpenAIProvider::new("sk-test").with_base_url(server.uri())),
    ];

    for provider in providers {
        let results = provider.embed_batch(Vec::new()).await.unwrap();
        assert!(results.is_empty(), "{} returned vectors", provider.name());
    }
}

#[tokio::test]
async fn test_batch_matches_single_embeddings() {
    let server = local_server().await;

    for use_batch_endpoint in [true, false] {
        let provider =
            LocalModelProvider::new(server.uri()).with_batch_endpoint(use_batch_endpoint);

        let batch = provider
            .embed_batch(vec![
                EmbeddingRequest::new("backend engineer"),
                EmbeddingRequest::new("pastry chef"),
            ])
            .await
            .unwrap();
        let first = provider.embed_text("backend engineer").await.unwrap();
        let second = provider.embed_text("pastry chef").await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].embedding, first);
        assert_eq!(batch[1].embedding, second);
    }
}

#[tokio::test]
async fn test_short_batch_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]],
            "count": 1,
            "dimension": 2
        })))
        .mount(&server)
        .await;

    let provider = LocalModelProvider::new(server.uri());
    let err = provider
        .embed_batch(vec![EmbeddingRequest::new("a"), EmbeddingRequest::new("b")])
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let local = LocalModelProvider::new(server.uri());
    let err = local.embed(EmbeddingRequest::new("text")).await.unwrap_err();
    assert!(matches!(
        err,
        EmbeddingError::ProviderUnavailable(ref msg) if msg.contains("model not loaded")
    ));

    let openai = OpenAIProvider::new("sk-test").with_base_url(server.uri());
    let err = openai.embed(EmbeddingRequest::new("text")).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_malformed_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = LocalModelProvider::new(server.uri());
    let err = provider.embed(EmbeddingRequest::new("text")).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    // Nothing listens on the discard port.
    let provider = LocalModelProvider::new("http://127.0.0.1:9");
    let err = provider.embed(EmbeddingRequest::new("text")).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_blank_text_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = LocalModelProvider::new(server.uri());
    let err = provider.embed(EmbeddingRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::EmptyInput));

    let err = provider
        .embed_batch(vec![EmbeddingRequest::new("ok"), EmbeddingRequest::new("")])
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddingError::EmptyInput));
}

#[tokio::test]
async fn test_rank_through_configured_local_provider() {
    let server = local_server().await;

    let config = EmbeddingConfig {
        provider: EmbeddingProviderType::LocalModel,
        cache_enabled: true,
        local_model: compahunt_embeddings::config::LocalModelConfig {
            base_url: server.uri(),
            ..Default::default()
        },
        ..EmbeddingConfig::default()
    };
    let service = SimilarityService::new(build_provider_with_key(&config, None).unwrap());

    let candidates = vec!["pastry chef".to_string(), "backend engineer".to_string()];
    let ranked = service.rank("rust developer", &candidates).await.unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].text, "backend engineer");
    assert!((ranked[0].score - 0.96).abs() < 1e-5);
    assert_eq!(ranked[1].text, "pastry chef");
    assert!(ranked[1].score.abs() < 1e-6);
}

#[tokio::test]
async fn test_openai_batch_sends_every_text_in_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_json(json!({
            "input": ["one", "two", "three"],
            "model": "text-embedding-3-small"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"embedding": [1.0, 0.0], "index": 0},
                {"embedding": [0.0, 1.0], "index": 1},
                {"embedding": [1.0, 1.0], "index": 2}
            ],
            "model": "text-embedding-3-small"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new("sk-test").with_base_url(server.uri());
    let results = provider
        .embed_batch(
            ["one", "two", "three"]
                .into_iter()
                .map(EmbeddingRequest::new)
                .collect(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[2].embedding, vec![1.0, 1.0]);
}
