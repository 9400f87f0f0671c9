//! Access logging
//!
//! One structured line per request, including rejected ones.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::snapshot::Identity;

/// Log method, path, application, status and duration of every request
///
/// The application comes from the [`Identity`] the auth middleware leaves in
/// the response extensions; it is absent for public or rejected requests.
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let response = next.run(request).await;

    let application = response
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.as_str().to_string());

    info!(
        method = %method,
        path = %path,
        application = ?application,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        remote_addr = ?remote_addr,
        "Request completed"
    );

    response
}
