//! Connected-viewer loop.
//!
//! Drives one subscribed WebSocket peer: feed chunks go out as binary
//! frames, pings keep the connection honest, and the inbound side is read
//! only to observe liveness and closure (viewers never send after the
//! subscription frame).

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::{Instant, interval, timeout};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::CloseReason;

// ============================================================================
// Constants
// ============================================================================

/// Deadline for any single outbound write.
const WRITE_DEADLINE: Duration = Duration::from_secs(10);

/// A peer that shows no inbound activity for this long is dropped.
const PONG_DEADLINE: Duration = Duration::from_secs(8);

/// Interval between outbound pings.
const PING_PERIOD: Duration = Duration::from_secs(5);

// ============================================================================
// Peer Loop
// ============================================================================

/// Streams feed chunks to one subscribed peer until the feed ends, the
/// peer disconnects, or the peer goes silent.
pub(crate) async fn run(
    ws: WebSocketStream<TcpStream>,
    mut feed: broadcast::Receiver<Bytes>,
) -> Result<()> {
    let (mut write, mut read) = ws.split();
    let mut ping = interval(PING_PERIOD);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            chunk = feed.recv() => match chunk {
                Ok(data) => {
                    send_with_deadline(&mut write, Message::Binary(data)).await?;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "peer lagging behind feed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    let frame = CloseReason::feed_ended().into_frame();
                    let _ = send_with_deadline(&mut write, Message::Close(Some(frame))).await;
                    return Ok(());
                }
            },

            message = read.next() => match message {
                Some(Ok(Message::Close(_))) => {
                    debug!("peer closed connection");
                    return Ok(());
                }
                Some(Ok(_)) => {
                    // Pongs and stray frames only refresh liveness.
                    last_seen = Instant::now();
                }
                Some(Err(e)) => {
                    debug!(error = %e, "peer read error");
                    return Ok(());
                }
                None => return Ok(()),
            },

            _ = ping.tick() => {
                if last_seen.elapsed() > PONG_DEADLINE {
                    debug!("peer missed pong deadline");
                    return Ok(());
                }
                send_with_deadline(&mut write, Message::Ping(Bytes::new())).await?;
            }
        }
    }
}

async fn send_with_deadline<S>(write: &mut S, message: Message) -> Result<()>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    timeout(WRITE_DEADLINE, write.send(message))
        .await
        .map_err(|_| Error::connection("write deadline exceeded"))??;
    Ok(())
}
