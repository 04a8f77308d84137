//! End-to-end tests against a running gateway.

use reqwest::StatusCode;
use std::sync::atomic::Ordering;
use std::time::Duration;

use yamifit_gateway::config::Environment;
use yamifit_gateway::GatewayConfig;

mod common;

const ALLOWED: &str = "http://localhost:5173";

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

async fn config_with_chat() -> (GatewayConfig, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    let (upstream, hits) = common::start_mock_chat().await;
    let mut config = GatewayConfig::default();
    config.chat.upstream_url = Some(format!("http://{upstream}"));
    (config, hits)
}

#[tokio::test]
async fn test_health_probe() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = client().get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn test_preflight_from_allowed_origin() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = client()
        .request(reqwest::Method::OPTIONS, gateway.url("/api/chat"))
        .header("origin", ALLOWED)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,authorization")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], ALLOWED);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_chat_is_forwarded() {
    let (config, hits) = config_with_chat().await;
    let gateway = common::start_gateway(config).await;

    let response = client()
        .post(gateway.url("/api/chat/messages"))
        .header("origin", ALLOWED)
        .header("authorization", "Bearer token-123")
        .json(&serde_json::json!({ "message": "high protein breakfast?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], ALLOWED);
    assert!(response.headers().contains_key("ratelimit-remaining"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["path"], "/api/chat/messages");
    assert_eq!(body["received"]["message"], "high protein breakfast?");
    assert_eq!(body["authorization"], "Bearer token-123");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_thirty_first_chat_request_is_throttled() {
    let (config, hits) = config_with_chat().await;
    let gateway = common::start_gateway(config).await;
    let client = client();

    for i in 0..30 {
        let response = client
            .post(gateway.url("/api/chat"))
            .json(&serde_json::json!({ "message": i }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i}");
    }

    let response = client
        .post(gateway.url("/api/chat"))
        .json(&serde_json::json!({ "message": "one too many" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(hits.load(Ordering::SeqCst), 30);

    // Outside the limited namespace.
    let health = client.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = client().get(gateway.url("/api/unknown")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_unreachable_upstream_hides_detail_outside_development() {
    let mut config = GatewayConfig::default();
    config.chat.upstream_url = Some(format!("http://{}", common::closed_address().await));
    let gateway = common::start_gateway(config).await;

    let response = client()
        .post(gateway.url("/api/chat"))
        .json(&serde_json::json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Something went wrong" }));
}

#[tokio::test]
async fn test_unreachable_upstream_shows_detail_in_development() {
    let mut config = GatewayConfig::default();
    config.environment = Environment::Development;
    config.chat.upstream_url = Some(format!("http://{}", common::closed_address().await));
    let gateway = common::start_gateway(config).await;

    let response = client()
        .post(gateway.url("/api/chat"))
        .json(&serde_json::json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Something went wrong");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_forwarding() {
    let (config, hits) = config_with_chat().await;
    let gateway = common::start_gateway(config).await;

    let response = client()
        .post(gateway.url("/api/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;
    gateway.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let result = client().get(gateway.url("/health")).send().await;
    assert!(result.is_err());
}
