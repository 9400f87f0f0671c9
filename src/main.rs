//! Portus - model alias proxy for the Portkey AI Gateway
//!
//! This is the main entry point for the Portus server.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use portus::{load_snapshot, routes, shutdown, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_directive().into()),
        )
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Portus");

    let vars: HashMap<String, String> = env::vars().collect();
    let snapshot = match load_snapshot(&config.config_path, &vars) {
        Ok(snapshot) => snapshot,
        Err(errors) => {
            eprintln!("Configuration errors:");
            for error in &errors {
                eprintln!("  - {error}");
            }
            process::exit(1);
        }
    };
    info!(
        config_path = %config.config_path.display(),
        aliases = snapshot.alias_count(),
        proxy_keys = snapshot.credential_count(),
        "Configuration loaded"
    );

    let (trigger, signal) = shutdown::channel();
    let state = Arc::new(AppState::new(config.clone(), snapshot, signal)?);
    let app = routes::create_router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        gateway = %config.gateway_url,
        "Listening"
    );

    let grace = config.shutdown_grace;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown::wait_for_signal().await;
        info!(grace_seconds = grace.as_secs(), "Draining in-flight requests");

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            warn!("Grace period elapsed, closing remaining streams");
            trigger.trigger();
        });
    })
    .await?;

    info!("Portus shutdown complete");
    Ok(())
}
