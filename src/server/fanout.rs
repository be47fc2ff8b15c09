//! WebSocket fan-out server.
//!
//! Accepts viewer connections on the fixed endpoint path, runs the
//! subscription handshake, and hands accepted peers to the peer loop.
//!
//! # Subscription Flow
//!
//! 1. TCP connection accepted, WebSocket upgrade on [`WEBSOCKET_PATH`]
//!    (any other path is rejected during the handshake).
//! 2. The first client frame must be a text frame naming the feed.
//! 3. Unknown feed: close `4002` with the reason naming the feed.
//!    Peer cap reached: close `4001`.
//! 4. Otherwise the peer receives the feed as binary frames until the
//!    feed ends (normal close) or the peer disconnects.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::FeedId;
use crate::protocol::{CloseReason, WEBSOCKET_PATH};
use crate::server::limiter::PeerLimiter;
use crate::server::{Hub, peer};

// ============================================================================
// Constants
// ============================================================================

/// Deadline for the client's subscription frame.
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Inbound message size limit. Viewers only ever send the subscription
/// frame, which is bounded by the feed id length.
const MAX_INBOUND_BYTES: usize = 256;

/// Deadline for draining the closing handshake of a rejected peer.
const REJECT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// FanoutServer
// ============================================================================

/// WebSocket server streaming live feeds to subscribed viewers.
pub struct FanoutServer {
    listener: TcpListener,
    hub: Arc<dyn Hub>,
    limiter: Arc<PeerLimiter>,
    port: u16,
}

impl FanoutServer {
    /// Binds the fan-out server to the given address.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(addr: &str, hub: Arc<dyn Hub>, limiter: Arc<PeerLimiter>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        debug!(port, "fan-out server bound");

        Ok(Self {
            listener,
            hub,
            limiter,
            port,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the local socket address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the listener has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves viewer connections until the process ends.
    ///
    /// Each accepted connection is handled on its own task; accept errors
    /// are logged and do not stop the loop.
    pub async fn serve(self) -> Result<()> {
        info!(port = self.port, "serving WebSocket fan-out");
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
            tokio::spawn(async move {
                if let Err(e) = handle_peer(stream, addr, hub, limiter).await {
                    debug!(%addr, error = %e, "peer session ended with error");
                }
            });
        }
    }
}

// ============================================================================
// Peer Handling
// ============================================================================

async fn handle_peer(
    stream: TcpStream,
    addr: SocketAddr,
    hub: Arc<dyn Hub>,
    limiter: Arc<PeerLimiter>,
) -> Result<()> {
    let config = WebSocketConfig::default()
        .max_message_size(Some(MAX_INBOUND_BYTES))
        .max_frame_size(Some(MAX_INBOUND_BYTES));

    let callback = |request: &Request, response: Response| {
        if request.uri().path() == WEBSOCKET_PATH {
            Ok(response)
        } else {
            let mut not_found = ErrorResponse::new(Some("no such endpoint".to_string()));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Err(not_found)
        }
    };

    let mut ws = accept_hdr_async_with_config(stream, callback, Some(config))
        .await
        .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

    debug!(%addr, "WebSocket connection established");

    let feed_id = match read_subscription(&mut ws).await {
        Ok(id) => id,
        Err(e) => {
            // Protocol violators are dropped without ceremony.
            debug!(%addr, error = %e, "subscription handshake failed");
            return Ok(());
        }
    };

    if !hub.feed_exists(&feed_id).await {
        info!(%addr, feed = %feed_id, "rejecting subscription: feed not found");
        return reject(ws, CloseReason::not_found(&feed_id)).await;
    }

    let Some(_permit) = limiter.try_add_peer(&feed_id) else {
        info!(%addr, feed = %feed_id, "rejecting subscription: peer limit reached");
        return reject(ws, CloseReason::too_many_peers()).await;
    };

    // The feed may have ended between the existence check and here.
    let feed = match hub.listen(&feed_id).await {
        Ok(feed) => feed,
        Err(_) => return reject(ws, CloseReason::not_found(&feed_id)).await,
    };

    info!(%addr, feed = %feed_id, "peer subscribed");
    let result = peer::run(ws, feed).await;
    debug!(%addr, feed = %feed_id, "peer session ended");
    result
}

/// Reads the subscription frame: one text frame naming the feed.
async fn read_subscription(ws: &mut WebSocketStream<TcpStream>) -> Result<FeedId> {
    let frame = timeout(SUBSCRIBE_TIMEOUT, ws.next())
        .await
        .map_err(|_| Error::protocol("subscription frame not received in time"))?
        .ok_or(Error::ConnectionClosed)??;

    match frame {
        Message::Text(text) => FeedId::new(text.as_str()),
        _ => Err(Error::protocol("subscription frame must be text")),
    }
}

/// Rejects a subscription with the given close outcome.
async fn reject(mut ws: WebSocketStream<TcpStream>, close: CloseReason) -> Result<()> {
    ws.close(Some(close.into_frame())).await?;
    // Drive the closing handshake so the frame reaches the peer before
    // the socket drops.
    let _ = timeout(REJECT_DRAIN_TIMEOUT, async {
        while let Some(message) = ws.next().await {
            if message.is_err() {
                break;
            }
        }
    })
    .await;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, Stream};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    use crate::protocol::close::{FEED_NOT_FOUND, NORMAL, TOO_MANY_PEERS};
    use crate::server::MemoryHub;

    fn feed(id: &str) -> FeedId {
        FeedId::new(id).expect("valid feed id")
    }

    /// Binds a server on a random port and serves it in the background.
    async fn start_server(hub: Arc<MemoryHub>, limiter: Arc<PeerLimiter>) -> String {
        let server = FanoutServer::bind("127.0.0.1:0", hub, limiter)
            .await
            .expect("bind should succeed");
        let url = format!("ws://127.0.0.1:{}{WEBSOCKET_PATH}", server.port());
        tokio::spawn(server.serve());
        url
    }

    /// Reads frames until a close frame arrives.
    async fn await_close(
        ws: &mut (impl Stream<Item = tokio_tungstenite::tungstenite::Result<Message>> + Unpin),
    ) -> Option<CloseFrame> {
        while let Some(message) = ws.next().await {
            match message {
                Ok(Message::Close(frame)) => return frame,
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    #[tokio::test]
    async fn test_unknown_feed_is_rejected_with_4002() {
        let hub = Arc::new(MemoryHub::new());
        let limiter = Arc::new(PeerLimiter::new(3, 5));
        let url = start_server(hub, limiter).await;

        let (mut ws, _) = connect_async(&url).await.expect("connect");
        ws.send(Message::text("ghost")).await.expect("subscribe");

        let frame = await_close(&mut ws).await.expect("close frame");
        assert_eq!(u16::from(frame.code), FEED_NOT_FOUND);
        assert_eq!(frame.reason.as_str(), "no such feed: ghost");
    }

    #[tokio::test]
    async fn test_feed_bytes_stream_to_peer() {
        let hub = Arc::new(MemoryHub::new());
        let limiter = Arc::new(PeerLimiter::new(3, 5));
        let id = feed("shell-17");
        hub.open_feed(&id).await.expect("open feed");

        let url = start_server(Arc::clone(&hub), limiter).await;

        let (mut ws, _) = connect_async(&url).await.expect("connect");
        ws.send(Message::text("shell-17")).await.expect("subscribe");

        // Push until the subscription is live; the hub does not replay.
        let pusher = {
            let hub = Arc::clone(&hub);
            let id = id.clone();
            tokio::spawn(async move {
                loop {
                    hub.push(&id, b"$ ls\n").await.expect("push");
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            })
        };

        let chunk = loop {
            match ws.next().await.expect("frame").expect("ok frame") {
                Message::Binary(data) => break data,
                _ => continue,
            }
        };
        assert_eq!(&chunk[..], b"$ ls\n");
        pusher.abort();

        // Producer disconnect ends the feed with a normal close.
        hub.close_feed(&id).await;
        let frame = await_close(&mut ws).await.expect("close frame");
        assert_eq!(u16::from(frame.code), NORMAL);
        assert_eq!(frame.reason.as_str(), "feed ended");
    }

    #[tokio::test]
    async fn test_peer_limit_is_rejected_with_4001() {
        let hub = Arc::new(MemoryHub::new());
        let limiter = Arc::new(PeerLimiter::new(1, 5));
        let id = feed("shell-17");
        hub.open_feed(&id).await.expect("open feed");

        let url = start_server(Arc::clone(&hub), Arc::clone(&limiter)).await;

        // First peer takes the only slot; confirm it is fully subscribed
        // by receiving a chunk.
        let (mut first, _) = connect_async(&url).await.expect("connect");
        first.send(Message::text("shell-17")).await.expect("subscribe");
        let pusher = {
            let hub = Arc::clone(&hub);
            let id = id.clone();
            tokio::spawn(async move {
                loop {
                    hub.push(&id, b"x").await.expect("push");
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            })
        };
        loop {
            if let Message::Binary(_) = first.next().await.expect("frame").expect("ok frame") {
                break;
            }
        }
        pusher.abort();
        assert_eq!(limiter.peer_count(&id), 1);

        let (mut second, _) = connect_async(&url).await.expect("connect");
        second.send(Message::text("shell-17")).await.expect("subscribe");

        let frame = await_close(&mut second).await.expect("close frame");
        assert_eq!(u16::from(frame.code), TOO_MANY_PEERS);
        assert_eq!(frame.reason.as_str(), "too many concurrent peers for this feed");
    }

    #[tokio::test]
    async fn test_unknown_path_is_rejected_during_handshake() {
        let hub = Arc::new(MemoryHub::new());
        let limiter = Arc::new(PeerLimiter::new(3, 5));
        let url = start_server(hub, limiter).await;

        let wrong_path = url.replace(WEBSOCKET_PATH, "/feed");
        assert!(connect_async(&wrong_path).await.is_err());
    }
}
