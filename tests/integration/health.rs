//! Health endpoint integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::{is_request_id, TestApp};
use portus::routes::health::HealthResponse;

#[tokio::test]
async fn test_health_requires_no_credentials() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "healthy");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    assert!(body.uptime.ends_with('s'), "uptime: {}", body.uptime);
}

#[tokio::test]
async fn test_health_has_request_id() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = app.server.get("/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(is_request_id(&request_id), "request id: {request_id}");
}

#[tokio::test]
async fn test_health_wrong_method() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = app.server.post("/health").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body, serde_json::json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_health_is_up_without_gateway() {
    let app = TestApp::new(crate::common::constants::UNREACHABLE_GATEWAY);

    app.server.get("/health").await.assert_status_ok();
}
