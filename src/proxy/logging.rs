//! Per-request logging for gateway proxying
//!
//! A [`RequestContext`] is created once the alias is resolved and carries the
//! correlation fields every proxy log event repeats.

use std::time::Instant;

use tracing::{debug, error, info, warn, Span};

use crate::snapshot::{AliasConfig, Identity};

/// Reported when an alias has no resolvable provider or model
pub const UNKNOWN: &str = "unknown";

/// Correlation and timing data for one proxied request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id, also returned as `X-Request-ID`
    pub request_id: String,
    /// Application the proxy key belongs to
    pub application: String,
    /// Gateway path being called
    pub endpoint: &'static str,
    /// Alias named in the request body
    pub alias: String,
    pub provider: String,
    /// Downstream model from the alias overrides
    pub resolved_model: String,
    pub streaming: bool,
    pub start_time: Instant,
}

impl RequestContext {
    pub fn new(
        request_id: impl Into<String>,
        identity: &Identity,
        endpoint: &'static str,
        alias: impl Into<String>,
        config: &AliasConfig,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            application: identity.to_string(),
            endpoint,
            alias: alias.into(),
            provider: config
                .primary_provider()
                .map_or(UNKNOWN, |provider| provider.as_str())
                .to_string(),
            resolved_model: config.resolved_model().unwrap_or(UNKNOWN).to_string(),
            streaming: false,
            start_time: Instant::now(),
        }
    }

    /// Mark this as a streaming request
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log the request being sent to the gateway (debug level)
    pub fn log_upstream_request(&self, url: &str, body_size: usize, timeout_secs: u64) {
        debug!(
            request_id = %self.request_id,
            provider = %self.provider,
            url = %url,
            body_size = %body_size,
            timeout_secs = %timeout_secs,
            "Sending request to gateway"
        );
    }

    /// Log the gateway response head
    pub fn log_upstream_response(&self, status: u16) {
        debug!(
            request_id = %self.request_id,
            endpoint = %self.endpoint,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from gateway"
        );
    }

    /// Log a transport failure before any response arrived
    pub fn log_connection_error(&self, error: &reqwest::Error, url: &str) {
        error!(
            request_id = %self.request_id,
            application = %self.application,
            provider = %self.provider,
            url = %url,
            timeout = %error.is_timeout(),
            connect = %error.is_connect(),
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Failed to reach gateway"
        );
    }

    /// Log an upstream body read failure mid-stream
    pub fn log_stream_error(&self, error: &reqwest::Error, bytes_sent: u64) {
        error!(
            request_id = %self.request_id,
            endpoint = %self.endpoint,
            bytes_sent = %bytes_sent,
            timeout = %error.is_timeout(),
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Error reading gateway response stream"
        );
    }

    /// Log the caller going away before the body was fully sent
    pub fn log_client_disconnect(&self, bytes_sent: u64) {
        warn!(
            request_id = %self.request_id,
            endpoint = %self.endpoint,
            bytes_sent = %bytes_sent,
            elapsed_ms = %self.elapsed_ms(),
            "Client disconnected during stream"
        );
    }

    /// Log the stream being cut by process shutdown
    pub fn log_shutdown_abort(&self, bytes_sent: u64) {
        warn!(
            request_id = %self.request_id,
            endpoint = %self.endpoint,
            bytes_sent = %bytes_sent,
            elapsed_ms = %self.elapsed_ms(),
            "Request aborted by shutdown"
        );
    }

    /// Emit the completion record for this request
    pub fn log_request_complete(&self, status: u16, bytes_sent: u64) {
        info!(
            request_id = %self.request_id,
            application = %self.application,
            endpoint = %self.endpoint,
            model_alias = %self.alias,
            provider = %self.provider,
            resolved_model = %self.resolved_model,
            streaming = %self.streaming,
            status = %status,
            bytes_sent = %bytes_sent,
            duration_ms = %self.elapsed_ms(),
            "Proxy request completed"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "proxy_request",
            request_id = %self.request_id,
            model_alias = %self.alias,
            provider = %self.provider,
        )
    }
}
