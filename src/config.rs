//! Configuration management for Portus
//!
//! Server settings are loaded from environment variables. Model aliases and
//! proxy keys live in the [`crate::snapshot`] module.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Directory containing `models/*.json`
    pub config_path: PathBuf,

    /// Portkey Gateway base URL
    pub gateway_url: String,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// How long in-flight requests may keep running after a shutdown signal
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: var("PORTUS_HOST", "0.0.0.0"),
            port: var("PORTUS_PORT", "8080")
                .parse()
                .context("Invalid PORTUS_PORT")?,

            config_path: PathBuf::from(var("PORTUS_CONFIG_PATH", "./config")),

            gateway_url: var("PORTKEY_GATEWAY_URL", "http://localhost:8787")
                .trim_end_matches('/')
                .to_string(),

            log_level: var("PORTUS_LOG_LEVEL", "info").to_lowercase(),

            shutdown_grace: Duration::from_secs(
                var("PORTUS_SHUTDOWN_GRACE_SECONDS", "30")
                    .parse()
                    .context("Invalid PORTUS_SHUTDOWN_GRACE_SECONDS")?,
            ),
        })
    }

    /// Default tracing directive derived from `PORTUS_LOG_LEVEL`
    pub fn log_directive(&self) -> String {
        let level = match self.log_level.as_str() {
            "debug" | "warn" | "error" => self.log_level.as_str(),
            _ => "info",
        };
        format!("portus={level},tower_http={level}")
    }
}
