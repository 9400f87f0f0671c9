//! Correlation IDs
//!
//! Every request gets an ID before authentication runs, so even rejected
//! calls can be traced. The ID is echoed in `X-Request-ID`.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use chrono::Utc;
use rand::Rng;

/// Response header carrying the correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 8;

/// Correlation ID stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Time-ordered prefix plus random suffix, e.g. `20250114093000-k3j9x0aa`
///
/// Unique enough for log correlation; not a security token.
pub fn generate_request_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}

/// Assign a [`RequestId`] and echo it on the response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = generate_request_id();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
