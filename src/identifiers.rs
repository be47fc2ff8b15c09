//! Type-safe identifiers for feeds.
//!
//! Feed ids are opaque string tokens. The newtype wrapper keeps them from
//! being mixed up with other strings (reason text, endpoint paths) at
//! compile time, and enforces the wire constraints in one place: the id is
//! sent as the subscription frame, so it must fit well within the server's
//! inbound read limit and must not carry control characters.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Maximum accepted feed id length in bytes.
pub const MAX_FEED_ID_LEN: usize = 128;

// ============================================================================
// FeedId
// ============================================================================

/// Identifier of a server-managed terminal feed.
///
/// Opaque to the client: supplied at construction time, sent exactly once
/// as the first outbound frame after the transport opens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(String);

impl FeedId {
    /// Creates a feed id after validating wire constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFeedId`] if the id is empty, longer than
    /// [`MAX_FEED_ID_LEN`] bytes, or contains whitespace or control
    /// characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_feed_id("feed id is empty"));
        }
        if id.len() > MAX_FEED_ID_LEN {
            return Err(Error::invalid_feed_id(format!(
                "feed id exceeds {MAX_FEED_ID_LEN} bytes"
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::invalid_feed_id(
                "feed id contains whitespace or control characters",
            ));
        }
        Ok(Self(id))
    }

    /// Generates a fresh random feed id.
    ///
    /// Used by the ingest server when a producer connects.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FeedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_feed_id() {
        let id = FeedId::new("shell-17").expect("valid feed id");
        assert_eq!(id.as_str(), "shell-17");
        assert_eq!(id.to_string(), "shell-17");
    }

    #[test]
    fn test_empty_feed_id_rejected() {
        assert!(FeedId::new("").is_err());
    }

    #[test]
    fn test_oversized_feed_id_rejected() {
        let long = "x".repeat(MAX_FEED_ID_LEN + 1);
        assert!(FeedId::new(long).is_err());
    }

    #[test]
    fn test_whitespace_rejected() {
        assert!(FeedId::new("shell 17").is_err());
        assert!(FeedId::new("shell\n17").is_err());
    }

    #[test]
    fn test_generated_id_is_valid() {
        let id = FeedId::generate();
        assert!(FeedId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(FeedId::generate(), FeedId::generate());
    }
}
