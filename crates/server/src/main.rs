use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tether_server::{serve, AppState, ServerConfig};

/// Tether companion dev server: path-multiplexed WebSocket endpoints for
/// device transport clients and debugging frontends.
#[derive(Parser, Debug)]
#[command(name = "tetherd", version)]
struct Cli {
    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = tether_protocol::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
    };

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            ctrl_c.cancel();
        }
    });

    serve(config, AppState::new(), shutdown).await
}
