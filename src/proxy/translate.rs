//! Alias resolution into gateway requests
//!
//! Turns a resolved [`AliasConfig`] into the `x-portkey-*` headers the
//! gateway understands and applies the Anthropic body defaults.

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use super::headers::{
    PORTKEY_ANTHROPIC_BETA, PORTKEY_CONFIG, PORTKEY_PROVIDER, PORTKEY_VERTEX_PROJECT_ID,
    PORTKEY_VERTEX_REGION,
};
use super::logging::UNKNOWN;
use super::request::{InboundRequest, MessagesRequest};
use crate::error::AppError;
use crate::snapshot::{
    AliasConfig, Params, Provider, ProviderSettings, RetryConfig, StrategyConfig, TargetConfig,
};

/// Token budget used when neither the caller nor the alias sets one
pub const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Gateway deadline when the alias sets no `request_timeout`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-request gateway config, serialized into `x-portkey-config`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutboundConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(flatten)]
    pub settings: ProviderSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_params: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
}

impl OutboundConfig {
    pub fn from_alias(alias: &AliasConfig) -> Self {
        let mut config = Self {
            retry: alias.retry.clone(),
            request_timeout: alias.request_timeout.filter(|ms| *ms > 0),
            ..Self::default()
        };

        match (&alias.strategy, alias.provider) {
            (Some(strategy), _) => {
                config.strategy = Some(strategy.clone());
                config.targets = alias.targets.clone();
            }
            (None, provider) => {
                config.provider = provider;
                config.settings = match provider {
                    Some(provider) => alias.settings.scoped_to(provider),
                    None => ProviderSettings {
                        api_key: alias.settings.api_key.clone(),
                        ..ProviderSettings::default()
                    },
                };
                config.override_params = alias
                    .override_params
                    .clone()
                    .filter(|params| !params.is_empty());
            }
        }

        config
    }

    /// Compact JSON header value
    pub fn to_header_value(&self) -> Result<HeaderValue, AppError> {
        let json = serde_json::to_string(self)
            .map_err(|err| anyhow::anyhow!("failed to serialize gateway config: {err}"))?;

        HeaderValue::from_bytes(json.as_bytes())
            .map_err(|err| anyhow::anyhow!("gateway config is not a valid header: {err}").into())
    }
}

/// Everything the executor needs beyond the inbound headers
#[derive(Debug, Clone)]
pub struct Translation {
    pub body: Bytes,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

/// Build the gateway request parts for `request` against `alias`
pub fn translate(
    request: &InboundRequest,
    body: Bytes,
    alias: &AliasConfig,
) -> Result<Translation, AppError> {
    let body = match request {
        InboundRequest::Messages(messages) => apply_message_defaults(body, messages, alias)?,
        InboundRequest::Chat(_) => body,
    };

    Ok(Translation {
        body,
        headers: gateway_headers(alias)?,
        timeout: request_timeout(alias),
    })
}

/// The `x-portkey-*` headers for `alias`
pub fn gateway_headers(alias: &AliasConfig) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(PORTKEY_CONFIG, OutboundConfig::from_alias(alias).to_header_value()?);

    let provider = alias.primary_provider();
    headers.insert(
        PORTKEY_PROVIDER,
        HeaderValue::from_static(provider.map_or(UNKNOWN, |p| p.as_str())),
    );

    match provider {
        Some(Provider::VertexAi) => {
            let settings = primary_settings(alias);
            let mut set = |name: &'static str, value: &Option<String>| -> Result<(), AppError> {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    headers.insert(name, header_value(value)?);
                }
                Ok(())
            };
            set(PORTKEY_VERTEX_PROJECT_ID, &settings.vertex_project_id)?;
            set(PORTKEY_VERTEX_REGION, &settings.vertex_region)?;
        }
        Some(Provider::Anthropic) if !alias.beta_headers.is_empty() => {
            headers.insert(
                PORTKEY_ANTHROPIC_BETA,
                header_value(&alias.beta_headers.join(","))?,
            );
        }
        _ => {}
    }

    Ok(headers)
}

/// Gateway deadline in whole seconds, at least one
pub fn request_timeout(alias: &AliasConfig) -> Duration {
    alias
        .request_timeout
        .filter(|ms| *ms > 0)
        .map_or(DEFAULT_TIMEOUT, |ms| Duration::from_secs((ms / 1000).max(1)))
}

/// Inject the token budget and thinking directive into a messages body
///
/// The body is returned untouched unless something is injected. Field order
/// is kept when it is rewritten.
pub fn apply_message_defaults(
    body: Bytes,
    request: &MessagesRequest,
    alias: &AliasConfig,
) -> Result<Bytes, AppError> {
    let max_tokens = (!request.has_max_tokens())
        .then(|| alias.default_max_tokens().unwrap_or(DEFAULT_MAX_TOKENS));
    let thinking = alias.thinking.as_ref().filter(|_| !request.has_thinking());

    if max_tokens.is_none() && thinking.is_none() {
        return Ok(body);
    }

    let mut fields: Map<String, Value> = serde_json::from_slice(&body)
        .map_err(|err| anyhow::anyhow!("failed to reparse request body: {err}"))?;

    if let Some(max_tokens) = max_tokens {
        fields.insert("max_tokens".to_string(), Value::from(max_tokens));
    }
    if let Some(thinking) = thinking {
        let thinking = serde_json::to_value(thinking)
            .map_err(|err| anyhow::anyhow!("failed to serialize thinking: {err}"))?;
        fields.insert("thinking".to_string(), thinking);
    }

    let body = serde_json::to_vec(&fields)
        .map_err(|err| anyhow::anyhow!("failed to serialize request body: {err}"))?;
    Ok(Bytes::from(body))
}

fn primary_settings(alias: &AliasConfig) -> &ProviderSettings {
    match (alias.provider, alias.targets.first()) {
        (None, Some(target)) => &target.settings,
        _ => &alias.settings,
    }
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|err| anyhow::anyhow!("invalid gateway header value: {err}").into())
}
