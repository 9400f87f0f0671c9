//! Models endpoint integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{bearer, constants, TestApp};
use portus::routes::models::ModelsResponse;

#[tokio::test]
async fn test_list_models_sorted() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = bearer(app.server.get("/v1/models"), constants::WEBAPP_KEY).await;

    response.assert_status_ok();
    let body: ModelsResponse = response.json();
    assert_eq!(body.object, "list");

    let ids: Vec<&str> = body.data.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["claude-sonnet", "gpt-4o", "quick", "smart-fallback"]);

    let created = app.state.started_at.timestamp();
    for model in &body.data {
        assert_eq!(model.object, "model");
        assert_eq!(model.owned_by, "portus");
        assert_eq!(model.created, created);
    }
}

#[tokio::test]
async fn test_list_models_requires_auth() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = app.server.get("/v1/models").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_models_wrong_method() {
    let (app, _gateway) = TestApp::with_gateway().await;

    let response = bearer(app.server.delete("/v1/models"), constants::CLI_KEY).await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
