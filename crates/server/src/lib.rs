//! `tether-server` — companion dev server for the event transport.
//!
//! Multiplexes logical endpoints by URL path on one listener: `/debugger`
//! for debugging frontends and `/device` for device-side transport clients.
//! Each path has its own client registry and inbound event stream.
//!
//! Connection flow (server side of the handshake contract):
//!
//! 1. Client connects to `ws://host:port/<path>`
//! 2. Server immediately sends a `CONNECTION_ESTABLISHED` envelope carrying
//!    a freshly issued `client_id` — this is the only frame a client may
//!    rely on receiving, and it gates everything the client sends
//! 3. Inbound envelopes are decoded tolerantly (malformed frames dropped),
//!    stamped into the registry, and published to channel subscribers
//! 4. On close the registry entry is removed

pub mod registry;
pub mod state;
pub mod ws;

use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

pub use registry::{ClientInfo, ClientRegistry, ConnectedClient};
pub use state::{AppState, Channel};

/// Listener configuration for [`serve`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: tether_protocol::DEFAULT_PORT,
        }
    }
}

/// Build the path-multiplexed router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/debugger", get(ws::debugger_ws))
        .route("/device", get(ws::device_ws))
        .with_state(state)
}

/// Bind and serve until the shutdown token fires.
pub async fn serve(
    config: ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "dev server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
