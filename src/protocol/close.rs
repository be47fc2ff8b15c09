//! Close codes and close-event classification.
//!
//! The server communicates *why* a subscription ended through reserved
//! application-level close codes in the 4000-4999 private-use range, rather
//! than generic abnormal-closure codes. This lets a viewer tell "capacity
//! exceeded" and "no such feed" apart from ordinary network disconnects and
//! surface the server's reason text instead of a generic indicator.
//!
//! Any other code (normal closure, going away, or no code at all) is an
//! unremarkable disconnection: the far end may close for many reasons that
//! do not warrant alarming the user.

// ============================================================================
// Imports
// ============================================================================

use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::identifiers::FeedId;

// ============================================================================
// Close Codes
// ============================================================================

/// Normal closure (RFC 6455).
pub const NORMAL: u16 = 1000;

/// Too many concurrent peers for the requested feed.
pub const TOO_MANY_PEERS: u16 = 4001;

/// The requested feed does not exist or has ended.
pub const FEED_NOT_FOUND: u16 = 4002;

// ============================================================================
// CloseClass
// ============================================================================

/// Category of a close event, per the fixed code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseClass {
    /// Ordinary disconnection; no reason is surfaced to the user.
    Ordinary,
    /// Subscription rejected: the feed is at its concurrent-peer limit.
    TooManyPeers,
    /// Subscription rejected: no such feed.
    FeedNotFound,
}

impl CloseClass {
    /// Classifies a close code.
    ///
    /// `None` (the transport closed without a code) classifies as
    /// [`CloseClass::Ordinary`].
    #[inline]
    #[must_use]
    pub fn classify(code: Option<u16>) -> Self {
        match code {
            Some(TOO_MANY_PEERS) => Self::TooManyPeers,
            Some(FEED_NOT_FOUND) => Self::FeedNotFound,
            _ => Self::Ordinary,
        }
    }

    /// Returns `true` if this class carries a user-visible reason.
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::TooManyPeers | Self::FeedNotFound)
    }
}

// ============================================================================
// CloseEvent
// ============================================================================

/// A transport close observation.
///
/// Produced exactly once per session by the transport upon disconnection,
/// whether server-initiated or network-initiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// Numeric close code, if the close frame carried one.
    pub code: Option<u16>,
    /// Human-readable reason supplied by the far end. May be empty.
    pub reason: String,
    /// Whether the close completed cleanly (a close frame was received).
    pub clean: bool,
}

impl CloseEvent {
    /// Creates a clean close event from a received close frame.
    #[inline]
    #[must_use]
    pub fn clean(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
            clean: true,
        }
    }

    /// Creates an unclean close event (no close frame was received).
    #[inline]
    #[must_use]
    pub fn unclean() -> Self {
        Self {
            code: None,
            reason: String::new(),
            clean: false,
        }
    }

    /// Classifies this event per the fixed code table.
    #[inline]
    #[must_use]
    pub fn class(&self) -> CloseClass {
        CloseClass::classify(self.code)
    }
}

// ============================================================================
// CloseReason
// ============================================================================

/// A server-outbound close outcome: code plus reason text.
///
/// The reason string is surfaced verbatim by viewers, so the constructors
/// own the exact wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// Close code to send.
    pub code: u16,
    /// Reason text to send.
    pub reason: String,
}

impl CloseReason {
    /// The requested feed does not exist.
    #[inline]
    #[must_use]
    pub fn not_found(feed_id: &FeedId) -> Self {
        Self {
            code: FEED_NOT_FOUND,
            reason: format!("no such feed: {feed_id}"),
        }
    }

    /// The requested feed is at its concurrent-peer limit.
    #[inline]
    #[must_use]
    pub fn too_many_peers() -> Self {
        Self {
            code: TOO_MANY_PEERS,
            reason: "too many concurrent peers for this feed".to_string(),
        }
    }

    /// The feed ended normally (producer disconnected).
    #[inline]
    #[must_use]
    pub fn feed_ended() -> Self {
        Self {
            code: NORMAL,
            reason: "feed ended".to_string(),
        }
    }

    /// Converts into a WebSocket close frame.
    #[inline]
    #[must_use]
    pub fn into_frame(self) -> CloseFrame {
        CloseFrame {
            code: CloseCode::from(self.code),
            reason: self.reason.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
