//! Authentication middleware
//!
//! Resolves the caller's proxy key to an application [`Identity`] using the
//! immutable snapshot. Missing and unknown keys both fail with 401.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::{
    error::AppError,
    snapshot::{ConfigSnapshot, Identity},
    AppState,
};

/// Header used by Anthropic SDKs to carry the key
pub const X_API_KEY: &str = "x-api-key";

/// Where a credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Authorization,
    ApiKey,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Authorization => "Authorization",
            CredentialSource::ApiKey => "x-api-key",
        }
    }
}

/// Strip an optional, case-insensitive `Bearer ` prefix
pub fn strip_bearer(value: &str) -> &str {
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &value[7..],
        _ => value,
    }
}

/// Extract the caller credential: `Authorization` first, then `x-api-key`
///
/// A present but empty `Authorization` header does not fall through to `x-api-key`.
pub fn extract_credential(headers: &HeaderMap) -> Option<(&str, CredentialSource)> {
    let non_empty = |name: &'static str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    };

    if let Some(authorization) = non_empty("authorization") {
        let token = strip_bearer(authorization);
        return (!token.is_empty()).then_some((token, CredentialSource::Authorization));
    }

    non_empty(X_API_KEY).map(|key| (key, CredentialSource::ApiKey))
}

/// Resolve the caller identity from request headers
pub fn authenticate(headers: &HeaderMap, snapshot: &ConfigSnapshot) -> Result<Identity, AppError> {
    let (credential, source) = extract_credential(headers).ok_or(AppError::MissingCredential)?;

    snapshot.identity_for(credential).cloned().ok_or_else(|| {
        warn!(source = %source.as_str(), "Invalid authorization key");
        AppError::InvalidCredential
    })
}

/// Authentication middleware
///
/// Adds the resolved [`Identity`] to request extensions for handlers, and to
/// response extensions for the access log.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(request.headers(), &state.snapshot).map_err(|err| {
        if matches!(err, AppError::MissingCredential) {
            warn!("Missing authorization header");
        }
        err
    })?;

    debug!(application = %identity, "Caller authenticated");

    request.extensions_mut().insert(identity.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(identity);

    Ok(response)
}
