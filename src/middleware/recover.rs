//! Panic recovery boundary
//!
//! A panic anywhere in request handling becomes a generic 500 instead of
//! tearing down the connection task. Details stay in the logs.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use tracing::error;

use crate::error::AppError;

/// Catch panics from inner layers and handlers
pub async fn recover_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                error = %message,
                path = %path,
                method = %method,
                "Panic recovered"
            );
            AppError::Internal(anyhow::anyhow!("handler panicked: {message}")).into_response()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
