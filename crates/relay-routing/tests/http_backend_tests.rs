//! Router tests against real HTTP clients and mock servers
#![cfg(test)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::tests_outside_test_module,
    reason = "Test code prioritizes clarity over efficiency"
)]

use relay_core::config::{ExternalBackendConfig, LocalBackendConfig};
use relay_core::{ModelProvider, RouterConfig};
use relay_routing::{QueryRouter, RouteRequest, RoutingError};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_config(base_url: String, health_timeout_ms: u64) -> RouterConfig {
    RouterConfig {
        local: LocalBackendConfig {
            base_url,
            health_timeout_ms,
            ..LocalBackendConfig::default()
        },
        ..RouterConfig::default()
    }
}

#[tokio::test]
/// # Panics
/// Panics if the health probe raises or overruns its timeout.
async fn test_health_against_unreachable_backend() {
    let router = QueryRouter::new(local_config("http://127.0.0.1:9".to_owned(), 500)).unwrap();

    let started = Instant::now();
    let status = router.health().await;

    assert!(!status.local_backend_reachable);
    assert!(!status.external_backend_configured);
    assert!(status.available_local_models.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
/// # Panics
/// Panics if a hanging backend is not cut off by the health timeout.
async fn test_health_against_hanging_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"models": []}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let router = QueryRouter::new(local_config(server.uri(), 200)).unwrap();

    let started = Instant::now();
    let status = router.health().await;

    assert!(!status.local_backend_reachable);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
/// # Panics
/// Panics if reported model names are not surfaced.
async fn test_health_lists_local_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "mistral:7b"}, {"name": "nomic-embed-text:latest"}]
        })))
        .mount(&server)
        .await;

    let router = QueryRouter::new(local_config(server.uri(), 1000)).unwrap();
    let status = router.health().await;

    assert!(status.local_backend_reachable);
    assert_eq!(
        status.available_local_models,
        vec!["mistral:7b".to_owned(), "nomic-embed-text:latest".to_owned()]
    );
    assert_eq!(
        status.missing_local_models,
        vec!["codellama:13b".to_owned(), "deepseek-coder:6.7b".to_owned()]
    );
}

#[tokio::test]
/// # Panics
/// Panics if a routed query does not reach Ollama with the decision's parameters.
async fn test_execute_through_ollama() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "deepseek-coder:6.7b",
            "stream": false,
            "options": {"num_predict": 4}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "deepseek-coder:6.7b",
            "response": "def calculate_fibonacci(n): ...",
            "done": true,
            "prompt_eval_count": 20,
            "eval_count": 12
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = QueryRouter::new(local_config(server.uri(), 1000)).unwrap();
    let result = router
        .execute(&RouteRequest::new("def calculate_fibonacci(n):"))
        .await
        .unwrap();

    assert_eq!(result.provider, ModelProvider::Local);
    assert_eq!(result.model, "deepseek-coder:6.7b");
    assert_eq!(result.tokens.total(), 32);
    assert_eq!(router.metrics().local_queries, 1);
}

#[tokio::test]
/// # Panics
/// Panics if an Ollama error status is not reported as a protocol error.
async fn test_ollama_error_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "model not found"})))
        .mount(&server)
        .await;

    let router = QueryRouter::new(local_config(server.uri(), 1000)).unwrap();
    let err = router
        .execute(&RouteRequest::new("What is 2+2?"))
        .await
        .unwrap_err();

    match err {
        RoutingError::BackendProtocol {
            provider, model, ..
        } => {
            assert_eq!(provider, ModelProvider::Local);
            assert_eq!(model, "mistral:7b");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(router.metrics().total_queries, 0);
}

#[tokio::test]
/// # Panics
/// Panics if the external path does not bill by reported token usage.
async fn test_external_call_is_billed_by_usage() {
    let ollama = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "local", "done": true})),
        )
        .mount(&ollama)
        .await;

    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "external"}}],
            "usage": {"prompt_tokens": 600_000, "completion_tokens": 400_000}
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let config = RouterConfig {
        external: ExternalBackendConfig {
            api_key: Some("sk-test".to_owned()),
            base_url: openai.uri(),
            ..ExternalBackendConfig::default()
        },
        ..local_config(ollama.uri(), 1000)
    };
    let router = QueryRouter::new(config).unwrap();
    let request = RouteRequest::new("Compare both replication strategies")
        .with_context_length(5000)
        .with_complexity(9);

    let first = router.execute(&request).await.unwrap();
    assert_eq!(first.provider, ModelProvider::Local);

    let second = router.execute(&request).await.unwrap();
    assert_eq!(second.provider, ModelProvider::External);
    assert_eq!(second.text, "external");
    assert!((second.decision.estimated_cost - 0.015).abs() < 1e-9);
    assert!((second.cost - 0.375).abs() < 1e-9);

    let snapshot = router.metrics();
    assert!((snapshot.total_cost - 0.375).abs() < 1e-9);
    assert!(router.health().await.external_backend_configured);
}
