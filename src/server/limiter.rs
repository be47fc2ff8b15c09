//! Concurrent-connection limits.
//!
//! Two in-memory limits protect the server: the number of concurrent
//! WebSocket peers per feed id, and the number of concurrent TCP producers
//! per source IP. When the server is scaled horizontally these counters
//! only see their own instance; per-deployment limiting belongs in the
//! load balancer.
//!
//! Slots are handed out as RAII permits, so a disconnecting peer can never
//! leak its slot.

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::identifiers::FeedId;

// ============================================================================
// PeerLimiter
// ============================================================================

/// Tracks ongoing peer and producer connections.
#[derive(Debug)]
pub struct PeerLimiter {
    max_peers_per_feed: usize,
    max_clients_per_ip: usize,
    inner: Mutex<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    peers: FxHashMap<String, usize>,
    clients: FxHashMap<IpAddr, usize>,
}

impl PeerLimiter {
    /// Creates a limiter with the given caps.
    #[inline]
    #[must_use]
    pub fn new(max_peers_per_feed: usize, max_clients_per_ip: usize) -> Self {
        Self {
            max_peers_per_feed,
            max_clients_per_ip,
            inner: Mutex::new(Counters::default()),
        }
    }

    /// Claims a viewer slot for the feed.
    ///
    /// Returns `None` when the feed is at its concurrent-peer cap. The
    /// slot is released when the permit drops.
    #[must_use]
    pub fn try_add_peer(self: &Arc<Self>, id: &FeedId) -> Option<PeerPermit> {
        let mut counters = self.inner.lock();
        let count = counters.peers.entry(id.as_str().to_string()).or_insert(0);
        if *count >= self.max_peers_per_feed {
            return None;
        }
        *count += 1;
        Some(PeerPermit {
            limiter: Arc::clone(self),
            key: id.as_str().to_string(),
        })
    }

    /// Claims a producer slot for the source IP.
    ///
    /// Returns `None` when the IP is at its concurrent-producer cap. The
    /// slot is released when the permit drops.
    #[must_use]
    pub fn try_add_client(self: &Arc<Self>, ip: IpAddr) -> Option<ClientPermit> {
        let mut counters = self.inner.lock();
        let count = counters.clients.entry(ip).or_insert(0);
        if *count >= self.max_clients_per_ip {
            return None;
        }
        *count += 1;
        Some(ClientPermit {
            limiter: Arc::clone(self),
            ip,
        })
    }

    /// Current viewer count for a feed.
    #[inline]
    #[must_use]
    pub fn peer_count(&self, id: &FeedId) -> usize {
        self.inner.lock().peers.get(id.as_str()).copied().unwrap_or(0)
    }

    fn release_peer(&self, key: &str) {
        let mut counters = self.inner.lock();
        if let Some(count) = counters.peers.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                counters.peers.remove(key);
            }
        }
    }

    fn release_client(&self, ip: IpAddr) {
        let mut counters = self.inner.lock();
        if let Some(count) = counters.clients.get_mut(&ip) {
            *count -= 1;
            if *count == 0 {
                counters.clients.remove(&ip);
            }
        }
    }
}

// ============================================================================
// Permits
// ============================================================================

/// RAII slot for one connected viewer.
#[derive(Debug)]
pub struct PeerPermit {
    limiter: Arc<PeerLimiter>,
    key: String,
}

impl Drop for PeerPermit {
    fn drop(&mut self) {
        self.limiter.release_peer(&self.key);
    }
}

/// RAII slot for one connected producer.
#[derive(Debug)]
pub struct ClientPermit {
    limiter: Arc<PeerLimiter>,
    ip: IpAddr,
}

impl Drop for ClientPermit {
    fn drop(&mut self) {
        self.limiter.release_client(self.ip);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    fn feed(id: &str) -> FeedId {
        FeedId::new(id).expect("valid feed id")
    }

    #[test]
    fn test_peer_cap_enforced() {
        let limiter = Arc::new(PeerLimiter::new(2, 5));
        let id = feed("shell-17");

        let first = limiter.try_add_peer(&id).expect("first slot");
        let _second = limiter.try_add_peer(&id).expect("second slot");
        assert!(limiter.try_add_peer(&id).is_none());
        assert_eq!(limiter.peer_count(&id), 2);

        drop(first);
        assert_eq!(limiter.peer_count(&id), 1);
        assert!(limiter.try_add_peer(&id).is_some());
    }

    #[test]
    fn test_feeds_are_limited_independently() {
        let limiter = Arc::new(PeerLimiter::new(1, 5));

        let _a = limiter.try_add_peer(&feed("a")).expect("slot for a");
        assert!(limiter.try_add_peer(&feed("a")).is_none());
        assert!(limiter.try_add_peer(&feed("b")).is_some());
    }

    #[test]
    fn test_client_cap_enforced() {
        let limiter = Arc::new(PeerLimiter::new(3, 1));
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);

        let permit = limiter.try_add_client(ip).expect("slot");
        assert!(limiter.try_add_client(ip).is_none());

        drop(permit);
        assert!(limiter.try_add_client(ip).is_some());
    }

    #[test]
    fn test_released_feed_entry_is_removed() {
        let limiter = Arc::new(PeerLimiter::new(2, 5));
        let id = feed("shell-17");

        let permit = limiter.try_add_peer(&id).expect("slot");
        drop(permit);

        assert_eq!(limiter.peer_count(&id), 0);
        assert!(limiter.inner.lock().peers.is_empty());
    }
}
