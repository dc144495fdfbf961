//! HTTP agent.
//!
//! Two routes are exposed:
//!
//! - `GET /logs/list` - files the access registry allows
//! - `GET /log/tail?fileName=<path>&search=<keyword>&count=<n>` - streamed tail
//!
//! Every request gets a child of the server's shutdown token, so shutting the
//! server down also stops in-flight scans.

pub mod body;
pub mod envelope;
pub mod handlers;

use crate::config::Config;
use crate::registry::AccessRegistry;
use crate::tail::TailSettings;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared, read-only state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: AccessRegistry,
    pub settings: TailSettings,
    pub stream_capacity: usize,
    pub debug: bool,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Self {
        Self {
            registry: AccessRegistry::new(config.allowed_log_locations.iter().cloned()),
            settings: config.tail_settings(),
            stream_capacity: config.stream_capacity,
            debug: config.debug,
            shutdown,
        }
    }
}

/// Build the agent's router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/logs/list", get(handlers::list_logs))
        .route("/log/tail", get(handlers::tail_log))
        .with_state(state)
}

/// Serve the agent on `listener` until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    config: &Config,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let state = AppState::from_config(config, shutdown.clone());
    let local_addr: SocketAddr = listener.local_addr()?;
    log::info!("rtail agent listening on {local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    log::info!("rtail agent stopped");
    Ok(())
}
