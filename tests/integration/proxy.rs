//! Proxy endpoint integration tests
//!
//! A wiremock server plays the Portkey gateway:
//! - alias resolution into `x-portkey-*` headers
//! - Anthropic body defaults
//! - header forwarding and response mirroring
//! - gateway failures

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{api_key, bearer, constants, TestApp};

fn config_header(request: &wiremock::Request) -> Value {
    let raw = request
        .headers
        .get("x-portkey-config")
        .expect("x-portkey-config header");
    serde_json::from_slice(raw.as_bytes()).expect("config header is JSON")
}

async fn only_request(gateway: &MockServer) -> wiremock::Request {
    let mut requests = gateway.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests.remove(0)
}

#[tokio::test]
async fn test_claude_sonnet_messages() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-portkey-provider", "anthropic"))
        .and(body_partial_json(json!({"max_tokens": 4096})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "type": "message",
            "content": [{"type": "text", "text": "Hello!"}]
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let response = api_key(app.server.post("/v1/messages"), constants::WEBAPP_KEY)
        .json(&json!({
            "model": "claude-sonnet",
            "messages": [{"role": "user", "content": "Hi"}]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], "msg_01");

    let sent = only_request(&gateway).await;
    assert_eq!(
        config_header(&sent),
        json!({
            "provider": "anthropic",
            "api_key": constants::ANTHROPIC_API_KEY,
            "override_params": {"model": "claude-sonnet-4-5"}
        })
    );
    let sent_body: Value = sent.body_json().unwrap();
    assert_eq!(sent_body["model"], "claude-sonnet");
    assert_eq!(sent_body["max_tokens"], 4096);
}

#[tokio::test]
async fn test_proxy_credentials_are_not_forwarded() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "chat.completion"})))
        .mount(&gateway)
        .await;

    let response = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .add_header(
            axum::http::HeaderName::from_static("x-trace-tag"),
            axum::http::HeaderValue::from_static("integration"),
        )
        .add_header(
            axum::http::HeaderName::from_static("x-portkey-provider"),
            axum::http::HeaderValue::from_static("spoofed"),
        )
        .json(&json!({"model": "gpt-4o", "messages": []}))
        .await;

    response.assert_status_ok();

    let sent = only_request(&gateway).await;
    assert!(sent.headers.get("authorization").is_none());
    assert!(sent.headers.get("x-api-key").is_none());
    assert_eq!(sent.headers.get("x-trace-tag").unwrap(), "integration");
    assert_eq!(sent.headers.get("x-portkey-provider").unwrap(), "openai");
    assert_eq!(config_header(&sent)["request_timeout"], 30000);
}

#[tokio::test]
async fn test_chat_body_forwarded_verbatim() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&gateway)
        .await;

    let raw = r#"{"model":"claude-sonnet",   "messages":[],"temperature":0.7}"#;
    bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .bytes(Bytes::from_static(raw.as_bytes()))
        .await
        .assert_status_ok();

    let sent = only_request(&gateway).await;
    assert_eq!(sent.body, raw.as_bytes());
}

#[tokio::test]
async fn test_caller_max_tokens_is_kept() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&gateway)
        .await;

    bearer(app.server.post("/v1/messages"), constants::CLI_KEY)
        .json(&json!({"model": "claude-sonnet", "max_tokens": 256, "messages": []}))
        .await
        .assert_status_ok();

    let sent_body: Value = only_request(&gateway).await.body_json().unwrap();
    assert_eq!(sent_body["max_tokens"], 256);
}

#[tokio::test]
async fn test_fallback_strategy_config() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&gateway)
        .await;

    bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .json(&json!({"model": "smart-fallback", "messages": []}))
        .await
        .assert_status_ok();

    let sent = only_request(&gateway).await;
    assert_eq!(sent.headers.get("x-portkey-provider").unwrap(), "anthropic");

    let config = config_header(&sent);
    assert_eq!(config["strategy"], json!({"mode": "fallback", "on_status_codes": [429, 500]}));
    assert_eq!(config["targets"].as_array().unwrap().len(), 2);
    assert_eq!(config["targets"][1]["provider"], "openai");
    assert_eq!(config["retry"], json!({"attempts": 2}));
    assert!(config.get("provider").is_none());
}

#[tokio::test]
async fn test_gateway_status_and_headers_mirrored() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({"error": {"message": "rate limited"}})),
        )
        .mount(&gateway)
        .await;

    let response = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .json(&json!({"model": "gpt-4o", "messages": []}))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("retry-after").unwrap(), "7");
    assert!(response.headers().get("x-request-id").is_some());
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "rate limited");
}

#[tokio::test]
async fn test_streaming_body_passes_through() {
    let (app, gateway) = TestApp::with_gateway().await;

    let events: String = (0..400)
        .map(|i| format!("data: {{\"index\":{i},\"delta\":\"token\"}}\n\n"))
        .chain(std::iter::once("data: [DONE]\n\n".to_string()))
        .collect();
    assert!(events.len() > 4096 * 3);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(events.clone(), "text/event-stream"))
        .mount(&gateway)
        .await;

    let response = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .json(&json!({"model": "gpt-4o", "stream": true, "messages": []}))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(response.text(), events);
}

#[tokio::test]
async fn test_unknown_alias() {
    let (app, gateway) = TestApp::with_gateway().await;

    let response = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .json(&json!({"model": "does-not-exist", "messages": []}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Unknown model alias"}));
    assert!(gateway.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_bodies() {
    let (app, gateway) = TestApp::with_gateway().await;

    let response = bearer(app.server.post("/v1/messages"), constants::WEBAPP_KEY)
        .text("{not json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Invalid request body"}));

    let response = bearer(app.server.post("/v1/messages"), constants::WEBAPP_KEY)
        .json(&json!({"messages": []}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Missing 'model' field in request"}));

    assert!(gateway.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_body_too_large() {
    let (app, gateway) = TestApp::with_gateway().await;

    let oversized = Bytes::from(vec![b' '; portus::routes::proxy::MAX_BODY_SIZE + 1]);
    let response = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .bytes(oversized)
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Request body too large"}));
    assert!(gateway.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_method_on_proxy_route() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = bearer(app.server.get("/v1/chat/completions"), constants::WEBAPP_KEY).await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_unreachable_gateway() {
    let app = TestApp::new(constants::UNREACHABLE_GATEWAY);

    let response = bearer(app.server.post("/v1/messages"), constants::WEBAPP_KEY)
        .json(&json!({"model": "claude-sonnet", "messages": []}))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Failed to reach gateway"}));
}

#[tokio::test]
async fn test_gateway_deadline() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&gateway)
        .await;

    let response = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .json(&json!({"model": "quick", "messages": []}))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_shutdown_cuts_pending_gateway_call() {
    let (app, gateway) = TestApp::with_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("late").set_delay(Duration::from_secs(4)))
        .mount(&gateway)
        .await;

    let started = Instant::now();
    let request = bearer(app.server.post("/v1/chat/completions"), constants::WEBAPP_KEY)
        .json(&json!({"model": "gpt-4o", "messages": []}));
    let shutdown = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        app.shutdown.trigger();
    };
    let (response, ()) = tokio::join!(async { request.await }, shutdown);

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "Failed to reach gateway"}));
    assert!(started.elapsed() < Duration::from_secs(3));
}
