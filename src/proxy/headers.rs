//! Header utilities for gateway proxying
//!
//! Decides which caller headers cross to the gateway and which gateway
//! response headers go back. The caller's proxy key never leaves Portus.

use axum::http::header::{HeaderMap, HeaderName};

/// `x-portkey-config`: compact JSON of the resolved gateway config
pub const PORTKEY_CONFIG: &str = "x-portkey-config";
/// `x-portkey-provider`: provider of the alias (or its first target)
pub const PORTKEY_PROVIDER: &str = "x-portkey-provider";
pub const PORTKEY_VERTEX_PROJECT_ID: &str = "x-portkey-vertex-project-id";
pub const PORTKEY_VERTEX_REGION: &str = "x-portkey-vertex-region";
pub const PORTKEY_ANTHROPIC_BETA: &str = "x-portkey-anthropic-beta";

/// Headers Portus sets itself; caller values for these are dropped
const GATEWAY_HEADERS: &[&str] = &[
    PORTKEY_CONFIG,
    PORTKEY_PROVIDER,
    PORTKEY_VERTEX_PROJECT_ID,
    PORTKEY_VERTEX_REGION,
    PORTKEY_ANTHROPIC_BETA,
];

/// Hop-by-hop headers plus the caller's proxy credentials
const PROXY_UNSAFE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "authorization",
    "x-api-key",
];

/// Framing headers the HTTP client recomputes for the outbound body
const FRAMING_HEADERS: &[&str] = &["host", "content-length"];

/// Hop-by-hop headers that must not be mirrored back to the caller
const HOP_BY_HOP_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn listed(list: &[&str], name: &HeaderName) -> bool {
    list.contains(&name.as_str())
}

/// Check if a caller header must not be forwarded to the gateway
///
/// `HeaderName` is always lowercase, so this match is case-insensitive.
pub fn is_proxy_unsafe_header(name: &HeaderName) -> bool {
    listed(PROXY_UNSAFE_HEADERS, name)
}

/// Build the outbound header set: caller headers minus the excluded ones,
/// then the gateway headers on top
pub fn build_upstream_headers(incoming: &HeaderMap, gateway_headers: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len() + gateway_headers.len());

    for (name, value) in incoming {
        if is_proxy_unsafe_header(name)
            || listed(GATEWAY_HEADERS, name)
            || listed(FRAMING_HEADERS, name)
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    for (name, value) in gateway_headers {
        headers.insert(name.clone(), value.clone());
    }

    headers
}

/// Copy gateway response headers for the caller, keeping repeated values
pub fn filter_response_headers(response_headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(response_headers.len());

    for (name, value) in response_headers {
        if !listed(HOP_BY_HOP_RESPONSE_HEADERS, name) {
            filtered.append(name.clone(), value.clone());
        }
    }

    filtered
}
