//! termfeed-server - minimal streaming feed server.
//!
//! Runs the TCP ingest listener and the WebSocket fan-out endpoint over a
//! shared in-memory hub. Configuration comes from `TERMFEED_*` environment
//! variables; see [`termfeed::config`].

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use termfeed::{Config, FanoutServer, Hub, IngestServer, MemoryHub, PeerLimiter, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("starting termfeed server with configuration:\n{config}");

    let hub: Arc<dyn Hub> = Arc::new(MemoryHub::new());
    let limiter = Arc::new(PeerLimiter::new(
        config.server.max_peers_per_feed,
        config.server.max_clients_per_ip,
    ));

    let fanout =
        FanoutServer::bind(&config.server.ws_addr, Arc::clone(&hub), Arc::clone(&limiter)).await?;
    let ingest = IngestServer::bind(
        &config.server.ingest_addr,
        config.server.public_host.clone(),
        hub,
        limiter,
    )
    .await?;

    tokio::try_join!(fanout.serve(), ingest.serve())?;
    Ok(())
}
