//! Alias configuration types
//!
//! One [`AliasConfig`] is parsed per `models/<alias>.json` file. Parameter
//! bags (`override_params`) are kept as ordered JSON maps so provider fields
//! this proxy does not understand survive untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Ordered, loosely-typed parameter bag
pub type Params = Map<String, Value>;

/// Upstream providers the gateway can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "bedrock")]
    Bedrock,
    #[serde(rename = "vertex-ai")]
    VertexAi,
}

impl Provider {
    /// Wire identifier used in configs and the `x-portkey-provider` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::Google => "google",
            Provider::Bedrock => "bedrock",
            Provider::VertexAi => "vertex-ai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-target routing mode, executed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMode {
    Fallback,
    Loadbalance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub mode: StrategyMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_status_codes: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_status_codes: Vec<u16>,
}

/// Anthropic extended-thinking directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub budget_tokens: u32,
}

/// Credential and location fields shared by single-provider aliases and targets
///
/// Only the fields relevant to the configured provider are expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_session_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_service_account_json: Option<String>,
}

impl ProviderSettings {
    /// Copy of these settings with only the fields `provider` uses
    pub fn scoped_to(&self, provider: Provider) -> Self {
        let mut scoped = Self {
            api_key: self.api_key.clone(),
            ..Self::default()
        };

        match provider {
            Provider::Bedrock => {
                scoped.aws_access_key_id = self.aws_access_key_id.clone();
                scoped.aws_secret_access_key = self.aws_secret_access_key.clone();
                scoped.aws_region = self.aws_region.clone();
                scoped.aws_session_token = self.aws_session_token.clone();
            }
            Provider::VertexAi => {
                scoped.vertex_project_id = self.vertex_project_id.clone();
                scoped.vertex_region = self.vertex_region.clone();
                scoped.vertex_service_account_json = self.vertex_service_account_json.clone();
            }
            Provider::Anthropic | Provider::OpenAi | Provider::Google => {}
        }

        scoped
    }

    /// Check the credential fields `provider` requires
    fn check(&self, provider: Provider) -> Result<(), MissingField> {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

        match provider {
            Provider::Anthropic | Provider::OpenAi | Provider::Google => {
                if !present(&self.api_key) {
                    return Err(MissingField::ApiKey);
                }
            }
            Provider::Bedrock => {
                if !present(&self.aws_access_key_id)
                    || !present(&self.aws_secret_access_key)
                    || !present(&self.aws_region)
                {
                    return Err(MissingField::AwsCredentials);
                }
            }
            Provider::VertexAi => {
                if !present(&self.vertex_project_id)
                    || !present(&self.vertex_region)
                    || !present(&self.vertex_service_account_json)
                {
                    return Err(MissingField::VertexConfiguration);
                }
            }
        }

        Ok(())
    }
}

/// One provider inside a fallback/loadbalance strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub provider: Provider,
    #[serde(flatten)]
    pub settings: ProviderSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// Configuration of a single model alias
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasConfig {
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(flatten)]
    pub settings: ProviderSettings,

    #[serde(default)]
    pub strategy: Option<StrategyConfig>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub override_params: Option<Params>,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Request timeout in milliseconds
    #[serde(default)]
    pub request_timeout: Option<u64>,

    #[serde(default)]
    pub thinking: Option<ThinkingConfig>,
    #[serde(default)]
    pub beta_headers: Vec<String>,
}

/// Credential field group a provider is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    ApiKey,
    AwsCredentials,
    VertexConfiguration,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::ApiKey => f.write_str("api_key"),
            MissingField::AwsCredentials => f.write_str("AWS credentials"),
            MissingField::VertexConfiguration => f.write_str("Vertex AI configuration"),
        }
    }
}

/// Reasons an alias configuration is rejected at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("model {alias} has no provider (and no strategy/targets)")]
    MissingProvider { alias: String },

    #[error("model {alias} has strategy but no targets")]
    EmptyTargets { alias: String },

    #[error("model {alias} has targets but no strategy")]
    TargetsWithoutStrategy { alias: String },

    #[error("model {alias} sets both a provider and a strategy")]
    ProviderWithStrategy { alias: String },

    #[error("model {alias} (provider {provider}) missing {missing}")]
    MissingCredentials {
        alias: String,
        provider: Provider,
        missing: MissingField,
    },

    #[error("model {alias} target {index} (provider {provider}) missing {missing}")]
    TargetMissingCredentials {
        alias: String,
        index: usize,
        provider: Provider,
        missing: MissingField,
    },
}

impl AliasConfig {
    /// Parse an alias from its (already substituted) JSON document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Provider reported in headers and logs: the alias provider, else the first target's
    pub fn primary_provider(&self) -> Option<Provider> {
        self.provider
            .or_else(|| self.targets.first().map(|target| target.provider))
    }

    /// Downstream model name from `override_params.model`, best effort
    pub fn resolved_model(&self) -> Option<&str> {
        fn model_of(params: &Option<Params>) -> Option<&str> {
            params
                .as_ref()
                .and_then(|p| p.get("model"))
                .and_then(Value::as_str)
        }

        model_of(&self.override_params)
            .or_else(|| self.targets.first().and_then(|t| model_of(&t.override_params)))
    }

    /// Default token budget from `override_params.max_tokens`
    pub fn default_max_tokens(&self) -> Option<u64> {
        let value = self.override_params.as_ref()?.get("max_tokens")?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|v| *v >= 1.0).map(|v| v as u64))
            .filter(|v| *v > 0)
    }

    /// Check the structural and credential invariants of this alias
    pub fn validate(&self, alias: &str) -> Result<(), ConfigError> {
        let alias_name = || alias.to_string();

        match (&self.strategy, self.provider) {
            (Some(_), Some(_)) => Err(ConfigError::ProviderWithStrategy { alias: alias_name() }),
            (Some(_), None) => {
                if self.targets.is_empty() {
                    return Err(ConfigError::EmptyTargets { alias: alias_name() });
                }
                for (index, target) in self.targets.iter().enumerate() {
                    target.settings.check(target.provider).map_err(|missing| {
                        ConfigError::TargetMissingCredentials {
                            alias: alias_name(),
                            index,
                            provider: target.provider,
                            missing,
                        }
                    })?;
                }
                Ok(())
            }
            (None, Some(provider)) => {
                if !self.targets.is_empty() {
                    return Err(ConfigError::TargetsWithoutStrategy { alias: alias_name() });
                }
                self.settings
                    .check(provider)
                    .map_err(|missing| ConfigError::MissingCredentials {
                        alias: alias_name(),
                        provider,
                        missing,
                    })
            }
            (None, None) => {
                if self.targets.is_empty() {
                    Err(ConfigError::MissingProvider { alias: alias_name() })
                } else {
                    Err(ConfigError::TargetsWithoutStrategy { alias: alias_name() })
                }
            }
        }
    }
}
