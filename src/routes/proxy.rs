//! Proxied endpoints
//!
//! `POST /v1/chat/completions` and `POST /v1/messages` share one pipeline:
//! read the body, resolve the alias, translate, then stream through the gateway.

use std::sync::Arc;

use axum::{
    body::{self, Body, Bytes},
    extract::{Request, State},
    response::Response,
};
use http_body_util::LengthLimitError;
use tracing::{warn, Instrument};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    proxy::{translate, InboundRequest, RequestContext, WireFormat},
    snapshot::Identity,
    AppState,
};

/// Largest accepted request body
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// OpenAI-compatible chat completions
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> AppResult<Response> {
    proxy_request(state, WireFormat::ChatCompletions, request).await
}

/// Anthropic-compatible messages
pub async fn messages(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> AppResult<Response> {
    proxy_request(state, WireFormat::Messages, request).await
}

async fn proxy_request(
    state: Arc<AppState>,
    format: WireFormat,
    request: Request,
) -> AppResult<Response> {
    let (parts, body) = request.into_parts();

    let identity = parts
        .extensions
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("proxy route reached without an identity"))?;
    let request_id = parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();

    let body = read_body(body).await?;
    let inbound = InboundRequest::parse(format, &body)?;

    let alias = state.snapshot.alias(inbound.model()).ok_or_else(|| {
        warn!(request_id = %request_id, alias = %inbound.model(), "Unknown model alias");
        AppError::UnknownAlias(inbound.model().to_string())
    })?;

    let ctx = RequestContext::new(request_id, &identity, format.path(), inbound.model(), alias)
        .with_streaming(inbound.is_streaming());
    let span = ctx.create_span();

    let translation = translate(&inbound, body, alias)?;

    state
        .gateway
        .forward(
            parts.method,
            &parts.headers,
            translation,
            ctx,
            state.shutdown.clone(),
        )
        .instrument(span)
        .await
}

/// Buffer the body, rejecting anything over [`MAX_BODY_SIZE`]
async fn read_body(body: Body) -> AppResult<Bytes> {
    body::to_bytes(body, MAX_BODY_SIZE).await.map_err(|err| {
        let source = err.into_inner();
        if source.is::<LengthLimitError>() {
            AppError::PayloadTooLarge
        } else {
            warn!(error = %source, "Failed to read request body");
            AppError::InvalidRequest("Failed to read request body".to_string())
        }
    })
}
