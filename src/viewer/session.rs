//! WebSocket transport session for the viewer.
//!
//! One [`ViewerSession`] owns exactly one connection attempt and lifetime.
//! It normalizes the platform's read-side behavior into the ordered
//! [`SessionEvent`] stream the controller consumes:
//!
//! - `Opened` once the handshake completes;
//! - `Message` per inbound chunk (binary-safe: chunks are raw bytes);
//! - `TransportError` if the read side fails without a close frame;
//! - exactly one terminating `Closed`, synthesized as unclean when the
//!   stream ends without one.
//!
//! The session never retries. Reconnection, if any, is a new session
//! created by a higher layer.

// ============================================================================
// Imports
// ============================================================================

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::protocol::CloseEvent;
use crate::viewer::SessionEvent;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

// ============================================================================
// ViewerSession
// ============================================================================

/// One streaming duplex connection to a feed server.
///
/// Owned exclusively by one controller-driving loop; never shared across
/// viewing sessions.
pub struct ViewerSession {
    write: WsWrite,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl ViewerSession {
    /// Establishes a connection and starts the read task.
    ///
    /// The first event delivered by [`ViewerSession::next_event`] is
    /// always `Opened`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`](crate::Error::WebSocket) if the
    /// handshake fails.
    pub async fn open(url: &Url) -> Result<Self> {
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        debug!(%url, "WebSocket connection established");

        let (write, read) = ws_stream.split();
        let (event_tx, events) = mpsc::unbounded_channel();

        // The handshake completed, so the session is open before any
        // inbound traffic is observed.
        let _ = event_tx.send(SessionEvent::Opened);
        tokio::spawn(Self::read_loop(read, event_tx));

        Ok(Self { write, events })
    }

    /// Transmits one outbound text frame.
    ///
    /// No acknowledgement is awaited; delivery is FIFO on the single
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`](crate::Error::WebSocket) if the
    /// connection is no longer writable.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        self.write.send(Message::text(text)).await?;
        Ok(())
    }

    /// Receives the next lifecycle event.
    ///
    /// Returns `None` after the terminating `Closed` event has been
    /// consumed and the read task has finished.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Read task: normalizes inbound frames into session events.
    async fn read_loop(mut read: WsRead, events: mpsc::UnboundedSender<SessionEvent>) {
        let mut settled = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Binary(data)) => {
                    if events.send(SessionEvent::Message(data.to_vec())).is_err() {
                        return;
                    }
                }

                Ok(Message::Text(text)) => {
                    // Tolerated: decoded the same way as binary chunks.
                    if events
                        .send(SessionEvent::Message(text.as_bytes().to_vec()))
                        .is_err()
                    {
                        return;
                    }
                }

                Ok(Message::Close(frame)) => {
                    let close = match frame {
                        Some(frame) => {
                            CloseEvent::clean(u16::from(frame.code), frame.reason.as_str())
                        }
                        None => CloseEvent {
                            code: None,
                            reason: String::new(),
                            clean: true,
                        },
                    };
                    debug!(code = ?close.code, reason = %close.reason, "server closed connection");
                    let _ = events.send(SessionEvent::Closed(close));
                    settled = true;
                    break;
                }

                // Ping/pong handled by the protocol layer.
                Ok(_) => {}

                Err(e) => {
                    warn!(error = %e, "WebSocket read error");
                    let _ = events.send(SessionEvent::TransportError);
                    break;
                }
            }
        }

        // A session that ends without a close frame still terminates with
        // exactly one close event.
        if !settled {
            let _ = events.send(SessionEvent::Closed(CloseEvent::unclean()));
        }
        debug!("read task finished");
    }
}

// ============================================================================
// Tests
// ============================================================================
