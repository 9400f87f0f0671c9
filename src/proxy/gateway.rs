//! Portkey gateway client
//!
//! Forwards a translated request and streams the gateway response back to
//! the caller as it arrives. Nothing is retried here; the gateway owns
//! retries, fallback and load balancing.

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Method, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::headers::{build_upstream_headers, filter_response_headers};
use super::logging::RequestContext;
use super::translate::Translation;
use crate::error::{AppError, AppResult};
use crate::shutdown::ShutdownSignal;

/// Size of each chunk written to the caller
pub const STREAM_CHUNK_SIZE: usize = 4096;

/// Pooled HTTP client bound to one gateway base URL
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Build a client with the shared connection pool settings
    ///
    /// There is no global timeout; each call carries the alias deadline.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Gateway URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send the request and stream the response back
    ///
    /// Fails only if no response head arrives, either because the call failed
    /// or because shutdown fired first. Once streaming starts, the
    /// completion record is logged when the stream ends or is dropped.
    pub async fn forward(
        &self,
        method: Method,
        incoming: &HeaderMap,
        translation: Translation,
        ctx: RequestContext,
        mut shutdown: ShutdownSignal,
    ) -> AppResult<Response> {
        let url = self.url(ctx.endpoint);
        let headers = build_upstream_headers(incoming, &translation.headers);
        ctx.log_upstream_request(&url, translation.body.len(), translation.timeout.as_secs());

        let send = self
            .client
            .request(method, &url)
            .headers(headers)
            .timeout(translation.timeout)
            .body(translation.body)
            .send();

        let upstream = tokio::select! {
            result = send => result.map_err(|err| {
                ctx.log_connection_error(&err, &url);
                ctx.log_request_complete(StatusCode::BAD_GATEWAY.as_u16(), 0);
                AppError::BadGateway(err)
            })?,
            _ = shutdown.cancelled() => {
                ctx.log_shutdown_abort(0);
                ctx.log_request_complete(StatusCode::BAD_GATEWAY.as_u16(), 0);
                return Err(AppError::GatewayAborted);
            }
        };

        let status = upstream.status();
        let response_headers = filter_response_headers(upstream.headers());
        ctx.log_upstream_response(status.as_u16());

        let mut response = Response::new(Body::from_stream(relay(
            upstream.bytes_stream(),
            StreamGuard::new(ctx, status.as_u16()),
            shutdown,
        )));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;

        Ok(response)
    }
}

/// Logs the completion record exactly once, however the stream ends
struct StreamGuard {
    ctx: RequestContext,
    status: u16,
    bytes_sent: u64,
    finished: bool,
}

impl StreamGuard {
    fn new(ctx: RequestContext, status: u16) -> Self {
        Self {
            ctx,
            status,
            bytes_sent: 0,
            finished: false,
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.ctx.log_client_disconnect(self.bytes_sent);
        }
        self.ctx.log_request_complete(self.status, self.bytes_sent);
    }
}

/// Re-chunk the gateway body until it ends, fails, or shutdown fires
fn relay<S>(
    upstream: S,
    mut guard: StreamGuard,
    mut shutdown: ShutdownSignal,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    async_stream::stream! {
        let mut upstream = Box::pin(upstream);

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => {
                    guard.ctx.log_shutdown_abort(guard.bytes_sent);
                    break;
                }
                next = upstream.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for chunk in chunks(bytes) {
                        guard.bytes_sent += chunk.len() as u64;
                        yield Ok::<_, std::io::Error>(chunk);
                    }
                }
                Some(Err(err)) => {
                    guard.ctx.log_stream_error(&err, guard.bytes_sent);
                    break;
                }
                None => break,
            }
        }

        guard.finished = true;
    }
}

/// Split `bytes` into pieces of at most [`STREAM_CHUNK_SIZE`]
fn chunks(mut bytes: Bytes) -> impl Iterator<Item = Bytes> {
    std::iter::from_fn(move || {
        if bytes.is_empty() {
            None
        } else {
            Some(bytes.split_to(bytes.len().min(STREAM_CHUNK_SIZE)))
        }
    })
}
