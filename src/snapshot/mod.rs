//! Immutable configuration snapshot
//!
//! Built once at startup and shared by `Arc` with every request handler.
//! Nothing on the request path mutates it, so lookups need no locking.

pub mod loader;
pub mod models;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub use loader::{load_snapshot, LoadError};
pub use models::{
    AliasConfig, ConfigError, Params, Provider, ProviderSettings, RetryConfig, StrategyConfig,
    StrategyMode, TargetConfig, ThinkingConfig,
};

/// Application name a proxy key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(application: impl Into<String>) -> Self {
        Self(application.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aliases and caller credentials, read-only once constructed
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    aliases: BTreeMap<String, AliasConfig>,
    credentials: HashMap<String, Identity>,
}

impl ConfigSnapshot {
    pub fn new(
        aliases: BTreeMap<String, AliasConfig>,
        credentials: HashMap<String, Identity>,
    ) -> Self {
        Self {
            aliases,
            credentials,
        }
    }

    /// Add an alias while building a snapshot
    pub fn with_alias(mut self, name: impl Into<String>, config: AliasConfig) -> Self {
        self.aliases.insert(name.into(), config);
        self
    }

    /// Register a credential while building a snapshot
    pub fn with_credential(mut self, key: impl Into<String>, identity: Identity) -> Self {
        self.credentials.insert(key.into(), identity);
        self
    }

    pub fn alias(&self, name: &str) -> Option<&AliasConfig> {
        self.aliases.get(name)
    }

    /// Aliases in name order
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &AliasConfig)> {
        self.aliases.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn identity_for(&self, credential: &str) -> Option<&Identity> {
        self.credentials.get(credential)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Validate every alias, collecting all errors
    pub fn validate(&self) -> Vec<ConfigError> {
        self.aliases
            .iter()
            .filter_map(|(name, config)| config.validate(name).err())
            .collect()
    }
}
