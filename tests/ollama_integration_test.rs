//! Wiremock integration tests for OllamaClient.
//!
//! These tests verify correct HTTP interaction and error handling using mocked responses.

use std::sync::Arc;
use std::time::Duration;

use huginn::{
    CompletionOptions, Domain, Huginn, HuginnError, OllamaClient, RecipeRequest, RetryConfig,
    TextCompletion,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OllamaClient {
    OllamaClient::with_base_url(server.uri(), "llama3.2:1b", Duration::from_secs(5)).unwrap()
}

/// Test successful non-streaming generation.
#[tokio::test]
async fn test_complete_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3.2:1b",
            "prompt": "Why is the sky blue?",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3.2:1b",
            "response": "Rayleigh scattering.",
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).complete("Why is the sky blue?").await;
    assert_eq!(result.expect("complete should succeed"), "Rayleigh scattering.");
}

/// Test that options override the model and are forwarded.
#[tokio::test]
async fn test_complete_with_options() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "mistral",
            "options": { "num_predict": 64 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "short answer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = CompletionOptions::new().model("mistral").max_tokens(64);
    let result = client(&mock_server)
        .complete_with_options("hi", &options)
        .await;
    assert_eq!(result.unwrap(), "short answer");
}

/// Test 404 maps to ModelNotFound.
#[tokio::test]
async fn test_model_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).complete("hi").await.unwrap_err();
    assert!(matches!(err, HuginnError::ModelNotFound(ref m) if m == "llama3.2:1b"));
    assert!(!err.is_transient());
}

/// Test 429 maps to RateLimited with the Retry-After hint.
#[tokio::test]
async fn test_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).complete("hi").await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
}

/// Test server errors are transient API errors.
#[tokio::test]
async fn test_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).complete("hi").await.unwrap_err();
    assert!(matches!(err, HuginnError::Api { status: 500, .. }));
    assert!(err.is_transient());
}

/// Test blank completion maps to EmptyResponse.
#[tokio::test]
async fn test_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "  "
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).complete("hi").await.unwrap_err();
    assert!(matches!(err, HuginnError::EmptyResponse));
}

/// Test malformed JSON maps to a Json error.
#[tokio::test]
async fn test_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).complete("hi").await.unwrap_err();
    assert!(matches!(err, HuginnError::Json(_)));
}

/// Full pipeline against a mocked Ollama server.
#[tokio::test]
async fn test_orchestrator_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Omelette"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let huginn = Huginn::builder()
        .ollama(mock_server.uri())
        .scheduled_eviction(false)
        .build()
        .unwrap();

    for _ in 0..3 {
        let recipe = huginn.recipe(RecipeRequest::new("eggs")).await.unwrap();
        assert_eq!(recipe.domain, Domain::Recipe);
        assert_eq!(recipe.text, "Omelette");
    }
}

/// A failing server is retried, then the recipe fallback is served.
#[tokio::test]
async fn test_orchestrator_falls_back_when_server_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let backend: Arc<dyn TextCompletion> = Arc::new(client(&mock_server));
    let huginn = Huginn::builder()
        .backend(backend)
        .retry(
            RetryConfig::new()
                .max_attempts(2)
                .initial_delay(Duration::from_millis(10)),
        )
        .scheduled_eviction(false)
        .build()
        .unwrap();

    let recipe = huginn.recipe(RecipeRequest::new("eggs")).await.unwrap();
    assert!(recipe.degraded);
    assert!(recipe.text.starts_with("Simple Recipe:"));
}
