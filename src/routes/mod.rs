//! HTTP routes for Portus
//!
//! This module defines all HTTP endpoints exposed by the proxy.

pub mod health;
pub mod models;
pub mod proxy;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    error::method_not_allowed,
    middleware::{
        access_log::access_log_middleware, auth::auth_middleware, recover::recover_middleware,
        request_id::request_id_middleware,
    },
    AppState,
};

/// Create the main application router
///
/// Middleware runs outermost first: request ID, access log, panic recovery,
/// then authentication on the protected routes only.
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/v1/chat/completions",
            post(proxy::chat_completions).fallback(method_not_allowed),
        )
        .route(
            "/v1/messages",
            post(proxy::messages).fallback(method_not_allowed),
        )
        .route(
            "/v1/models",
            get(models::list_models).fallback(method_not_allowed),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new().route(
        "/health",
        get(health::health_check).fallback(method_not_allowed),
    );

    with_middleware(Router::new().merge(public_routes).merge(protected_routes)).with_state(state)
}

/// Wrap `router` in the shared middleware stack
///
/// Layers wrap everything added before them, so the last one runs first.
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(middleware::from_fn(recover_middleware))
        .layer(middleware::from_fn(access_log_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
