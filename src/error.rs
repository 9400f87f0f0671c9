//! Error types for Portus
//!
//! Every failure that reaches a caller is rendered as `{"error": "<message>"}`
//! with a matching status code. Internal details are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// No credential was supplied in `Authorization` or `x-api-key`
    #[error("Missing Authorization header")]
    MissingCredential,

    /// A credential was supplied but is not in the snapshot
    #[error("Invalid Authorization key")]
    InvalidCredential,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unknown model alias")]
    UnknownAlias(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The gateway could not be reached (DNS, connect, TLS, deadline before headers)
    #[error("Failed to reach gateway")]
    BadGateway(#[source] reqwest::Error),

    /// Shutdown fired before the gateway answered
    #[error("Failed to reach gateway")]
    GatewayAborted,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status code the caller sees for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential | AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) | AppError::UnknownAlias(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadGateway(_) | AppError::GatewayAborted => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Fallback for known paths hit with the wrong HTTP method
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
