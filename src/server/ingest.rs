//! TCP ingest server for feed producers.
//!
//! Producers pipe terminal output straight into a TCP connection
//! (`some-cmd | nc host 1337`). Each connection gets a fresh feed id and a
//! greeting naming it; every chunk read afterwards is pushed to the hub
//! until the producer disconnects, which ends the feed.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::identifiers::FeedId;
use crate::server::Hub;
use crate::server::limiter::PeerLimiter;

// ============================================================================
// Constants
// ============================================================================

/// Read buffer size for producer chunks.
const READ_BUFSIZE: usize = 1024;

/// Line written to producers rejected by the per-IP cap.
const REJECT_MESSAGE: &[u8] = b"too many concurrent sessions from this address\n";

// ============================================================================
// IngestServer
// ============================================================================

/// TCP server that turns producer connections into live feeds.
pub struct IngestServer {
    listener: TcpListener,
    hub: Arc<dyn Hub>,
    limiter: Arc<PeerLimiter>,
    public_host: String,
    port: u16,
}

impl IngestServer {
    /// Binds the ingest server to the given address.
    ///
    /// `public_host` is the externally reachable fan-out host shown to
    /// producers in the greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn bind(
        addr: &str,
        public_host: impl Into<String>,
        hub: Arc<dyn Hub>,
        limiter: Arc<PeerLimiter>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        debug!(port, "ingest server bound");

        Ok(Self {
            listener,
            hub,
            limiter,
            public_host: public_host.into(),
            port,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Serves producer connections until the process ends.
    pub async fn serve(self) -> Result<()> {
        info!(port = self.port, "serving TCP ingest");
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            let hub = Arc::clone(&self.hub);
            let limiter = Arc::clone(&self.limiter);
            let public_host = self.public_host.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_producer(stream, addr, hub, limiter, public_host).await {
                    debug!(%addr, error = %e, "producer session ended with error");
                }
            });
        }
    }
}

// ============================================================================
// Producer Handling
// ============================================================================

async fn handle_producer(
    mut stream: TcpStream,
    addr: SocketAddr,
    hub: Arc<dyn Hub>,
    limiter: Arc<PeerLimiter>,
    public_host: String,
) -> Result<()> {
    let Some(_permit) = limiter.try_add_client(addr.ip()) else {
        info!(%addr, "rejecting producer: client limit reached");
        let _ = stream.write_all(REJECT_MESSAGE).await;
        return Ok(());
    };

    let feed_id = FeedId::generate();
    hub.open_feed(&feed_id).await?;
    info!(%addr, feed = %feed_id, "producer connected");

    let result = pump(&mut stream, &feed_id, hub.as_ref(), &public_host).await;

    hub.close_feed(&feed_id).await;
    info!(feed = %feed_id, "producer disconnected, feed closed");
    result
}

/// Greets the producer, then forwards its bytes to the hub until EOF.
async fn pump(
    stream: &mut TcpStream,
    feed_id: &FeedId,
    hub: &dyn Hub,
    public_host: &str,
) -> Result<()> {
    let greeting = format!(
        "streaming to feed {feed_id}\nwatch with: termfeed-view --host {public_host} {feed_id}\n\n"
    );
    stream.write_all(greeting.as_bytes()).await?;

    let mut buf = vec![0u8; READ_BUFSIZE];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            // EOF: the producer closed its pipe.
            return Ok(());
        }
        hub.push(feed_id, &buf[..n]).await?;
    }
}

// ============================================================================
// Tests
// ============================================================================
