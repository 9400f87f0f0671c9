//! Portus - model alias proxy for the Portkey AI Gateway
//!
//! Callers name a short model alias; Portus authenticates them, resolves the
//! alias into a full gateway configuration and streams the call through.

pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod shutdown;
pub mod snapshot;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};

pub use crate::config::Config;
pub use crate::proxy::GatewayClient;
pub use crate::shutdown::{ShutdownSignal, ShutdownTrigger};
pub use crate::snapshot::{load_snapshot, ConfigSnapshot};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Aliases and proxy keys, read-only for the process lifetime
    pub snapshot: Arc<ConfigSnapshot>,
    /// Pooled client for the Portkey gateway
    pub gateway: GatewayClient,
    pub start_time: Instant,
    /// Wall-clock start, reported as `created` by `/v1/models`
    pub started_at: DateTime<Utc>,
    /// Observed by response streams to end on forced shutdown
    pub shutdown: ShutdownSignal,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, snapshot: ConfigSnapshot, shutdown: ShutdownSignal) -> Result<Self> {
        let gateway = GatewayClient::new(config.gateway_url.clone())?;

        Ok(Self {
            config,
            snapshot: Arc::new(snapshot),
            gateway,
            start_time: Instant::now(),
            started_at: Utc::now(),
            shutdown,
        })
    }
}
