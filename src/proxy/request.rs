//! Inbound request shapes
//!
//! Only the fields Portus reads are typed. Everything else in the body is
//! forwarded byte-for-byte, so these types are never serialized back.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;

/// Client-facing wire protocol of an inbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// OpenAI-style `POST /v1/chat/completions`
    ChatCompletions,
    /// Anthropic-style `POST /v1/messages`
    Messages,
}

impl WireFormat {
    /// Path on both Portus and the gateway
    pub fn path(&self) -> &'static str {
        match self {
            WireFormat::ChatCompletions => "/v1/chat/completions",
            WireFormat::Messages => "/v1/messages",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<Value>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub thinking: Option<Value>,
}

impl MessagesRequest {
    /// Whether the caller set a token budget; null and zero count as unset
    pub fn has_max_tokens(&self) -> bool {
        match &self.max_tokens {
            None | Some(Value::Null) => false,
            Some(Value::Number(tokens)) => tokens.as_f64() != Some(0.0),
            Some(_) => true,
        }
    }

    pub fn has_thinking(&self) -> bool {
        self.thinking.as_ref().is_some_and(|value| !value.is_null())
    }
}

/// Parsed view of an inbound body, tagged by wire shape
#[derive(Debug, Clone)]
pub enum InboundRequest {
    Chat(ChatCompletionRequest),
    Messages(MessagesRequest),
}

impl InboundRequest {
    /// Parse `body` as `format`, requiring a non-empty `model`
    pub fn parse(format: WireFormat, body: &[u8]) -> Result<Self, AppError> {
        let request = match format {
            WireFormat::ChatCompletions => serde_json::from_slice(body).map(InboundRequest::Chat),
            WireFormat::Messages => serde_json::from_slice(body).map(InboundRequest::Messages),
        }
        .map_err(|err| {
            debug!(error = %err, path = format.path(), "Failed to parse request body");
            AppError::InvalidRequest("Invalid request body".to_string())
        })?;

        if request.model().is_empty() {
            return Err(AppError::InvalidRequest(
                "Missing 'model' field in request".to_string(),
            ));
        }

        Ok(request)
    }

    pub fn format(&self) -> WireFormat {
        match self {
            InboundRequest::Chat(_) => WireFormat::ChatCompletions,
            InboundRequest::Messages(_) => WireFormat::Messages,
        }
    }

    /// Alias the caller asked for
    pub fn model(&self) -> &str {
        let model = match self {
            InboundRequest::Chat(request) => &request.model,
            InboundRequest::Messages(request) => &request.model,
        };
        model.as_deref().unwrap_or_default()
    }

    pub fn is_streaming(&self) -> bool {
        let stream = match self {
            InboundRequest::Chat(request) => request.stream,
            InboundRequest::Messages(request) => request.stream,
        };
        stream.unwrap_or(false)
    }
}
