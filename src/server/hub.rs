//! Central feed and streamed-data management layer.
//!
//! The hub tracks which feeds are live and fans pushed bytes out to every
//! listening peer. Feeds are live only while their producer is connected:
//! there is no persistence and no replay, so a peer that subscribes late
//! sees only bytes pushed after its subscription.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Bytes;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::FeedId;

// ============================================================================
// Constants
// ============================================================================

/// Per-feed broadcast capacity in chunks. A peer that falls further behind
/// than this skips ahead and misses the overwritten chunks.
pub const FEED_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Hub
// ============================================================================

/// Feed registry and fan-out.
///
/// One producer drives each feed through [`Hub::open_feed`], [`Hub::push`]
/// and [`Hub::close_feed`]; any number of peers consume it through
/// [`Hub::listen`], subject to the peer limiter upstream.
#[async_trait]
pub trait Hub: Send + Sync {
    /// Returns `true` if the identified feed is live.
    async fn feed_exists(&self, id: &FeedId) -> bool;

    /// Registers a feed as live.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedAlreadyOpen`] if the id is in use.
    async fn open_feed(&self, id: &FeedId) -> Result<()>;

    /// Ends a feed. Every listener stream terminates.
    async fn close_feed(&self, id: &FeedId);

    /// Pushes one chunk of producer bytes to the identified feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedNotFound`] if the feed is not live.
    async fn push(&self, id: &FeedId, data: &[u8]) -> Result<()>;

    /// Subscribes to the identified feed's live chunk stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedNotFound`] if the feed is not live.
    async fn listen(&self, id: &FeedId) -> Result<broadcast::Receiver<Bytes>>;
}

// ============================================================================
// MemoryHub
// ============================================================================

/// In-memory hub implementation.
///
/// Suitable for a single-instance deployment; feed state is not shared
/// across processes.
#[derive(Debug)]
pub struct MemoryHub {
    feeds: Mutex<FxHashMap<String, broadcast::Sender<Bytes>>>,
    capacity: usize,
}

impl MemoryHub {
    /// Creates a hub with the default per-feed capacity.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(FEED_CHANNEL_CAPACITY)
    }

    /// Creates a hub with a custom per-feed capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            feeds: Mutex::new(FxHashMap::default()),
            capacity,
        }
    }

    /// Number of currently live feeds.
    #[inline]
    #[must_use]
    pub fn live_feeds(&self) -> usize {
        self.feeds.lock().len()
    }
}

impl Default for MemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hub for MemoryHub {
    async fn feed_exists(&self, id: &FeedId) -> bool {
        self.feeds.lock().contains_key(id.as_str())
    }

    async fn open_feed(&self, id: &FeedId) -> Result<()> {
        let mut feeds = self.feeds.lock();
        if feeds.contains_key(id.as_str()) {
            return Err(Error::feed_already_open(id.as_str()));
        }
        let (tx, _) = broadcast::channel(self.capacity);
        feeds.insert(id.as_str().to_string(), tx);
        debug!(feed = %id, "feed opened");
        Ok(())
    }

    async fn close_feed(&self, id: &FeedId) {
        // Dropping the sender terminates every listener stream.
        if self.feeds.lock().remove(id.as_str()).is_some() {
            debug!(feed = %id, "feed closed");
        }
    }

    async fn push(&self, id: &FeedId, data: &[u8]) -> Result<()> {
        let tx = {
            let feeds = self.feeds.lock();
            feeds
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| Error::feed_not_found(id.as_str()))?
        };
        // No listeners is not an error: bytes on an unwatched live feed
        // are simply dropped.
        let _ = tx.send(Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn listen(&self, id: &FeedId) -> Result<broadcast::Receiver<Bytes>> {
        let feeds = self.feeds.lock();
        feeds
            .get(id.as_str())
            .map(broadcast::Sender::subscribe)
            .ok_or_else(|| Error::feed_not_found(id.as_str()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(id: &str) -> FeedId {
        FeedId::new(id).expect("valid feed id")
    }

    #[tokio::test]
    async fn test_open_close_lifecycle() {
        let hub = MemoryHub::new();
        let id = feed("shell-17");

        assert!(!hub.feed_exists(&id).await);
        hub.open_feed(&id).await.expect("open");
        assert!(hub.feed_exists(&id).await);
        assert_eq!(hub.live_feeds(), 1);

        hub.close_feed(&id).await;
        assert!(!hub.feed_exists(&id).await);
        assert_eq!(hub.live_feeds(), 0);
    }

    #[tokio::test]
    async fn test_open_twice_is_rejected() {
        let hub = MemoryHub::new();
        let id = feed("shell-17");

        hub.open_feed(&id).await.expect("open");
        let err = hub.open_feed(&id).await.expect_err("collision");
        assert!(matches!(err, Error::FeedAlreadyOpen { .. }));
    }

    #[tokio::test]
    async fn test_push_and_listen_in_order() {
        let hub = MemoryHub::new();
        let id = feed("shell-17");
        hub.open_feed(&id).await.expect("open");

        let mut rx = hub.listen(&id).await.expect("listen");
        hub.push(&id, b"$ ls\n").await.expect("push");
        hub.push(&id, b"a b c\n").await.expect("push");

        assert_eq!(rx.recv().await.expect("chunk"), Bytes::from_static(b"$ ls\n"));
        assert_eq!(rx.recv().await.expect("chunk"), Bytes::from_static(b"a b c\n"));
    }

    #[tokio::test]
    async fn test_no_replay_for_late_listeners() {
        let hub = MemoryHub::new();
        let id = feed("shell-17");
        hub.open_feed(&id).await.expect("open");

        hub.push(&id, b"before").await.expect("push");
        let mut rx = hub.listen(&id).await.expect("listen");
        hub.push(&id, b"after").await.expect("push");

        assert_eq!(rx.recv().await.expect("chunk"), Bytes::from_static(b"after"));
    }

    #[tokio::test]
    async fn test_close_terminates_listeners() {
        let hub = MemoryHub::new();
        let id = feed("shell-17");
        hub.open_feed(&id).await.expect("open");

        let mut rx = hub.listen(&id).await.expect("listen");
        hub.close_feed(&id).await;

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_unknown_feed_operations_fail() {
        let hub = MemoryHub::new();
        let id = feed("ghost");

        assert!(matches!(
            hub.push(&id, b"x").await,
            Err(Error::FeedNotFound { .. })
        ));
        assert!(matches!(
            hub.listen(&id).await,
            Err(Error::FeedNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_push_without_listeners_is_ok() {
        let hub = MemoryHub::new();
        let id = feed("shell-17");
        hub.open_feed(&id).await.expect("open");

        hub.push(&id, b"unwatched").await.expect("push");
    }
}
