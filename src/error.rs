//! Error types for termfeed.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use termfeed::{Result, ViewerSession};
//!
//! async fn example(url: &url::Url) -> Result<()> {
//!     let mut session = ViewerSession::open(url).await?;
//!     session.send("shell-17").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidFeedId`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`] |
//! | Feed | [`Error::FeedNotFound`], [`Error::FeedAlreadyOpen`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::UrlParse`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when server or viewer configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Feed identifier failed validation.
    ///
    /// Returned when a feed id is empty, too long, or contains
    /// control characters.
    #[error("Invalid feed id: {message}")]
    InvalidFeedId {
        /// Description of the validation failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection establishment failed.
    ///
    /// Returned when a WebSocket or TCP connection cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed unexpectedly.
    ///
    /// Returned when an operation is attempted on a closed connection.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    ///
    /// Returned when a peer deviates from the subscription protocol,
    /// e.g. the first inbound frame is not a text frame.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Feed Errors
    // ========================================================================
    /// No live feed with the given id.
    ///
    /// Returned by hub operations targeting an unknown or ended feed.
    #[error("Feed not found: {feed_id}")]
    FeedNotFound {
        /// The missing feed's id.
        feed_id: String,
    },

    /// A feed with the given id is already live.
    ///
    /// Returned when a producer tries to open a feed id that is in use.
    #[error("Feed already open: {feed_id}")]
    FeedAlreadyOpen {
        /// The colliding feed id.
        feed_id: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parsing error (malformed host or endpoint).
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid feed id error.
    #[inline]
    pub fn invalid_feed_id(message: impl Into<String>) -> Self {
        Self::InvalidFeedId {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a feed not found error.
    #[inline]
    pub fn feed_not_found(feed_id: impl Into<String>) -> Self {
        Self::FeedNotFound {
            feed_id: feed_id.into(),
        }
    }

    /// Creates a feed already open error.
    #[inline]
    pub fn feed_already_open(feed_id: impl Into<String>) -> Self {
        Self::FeedAlreadyOpen {
            feed_id: feed_id.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error names a specific feed.
    #[inline]
    #[must_use]
    pub fn is_feed_error(&self) -> bool {
        matches!(
            self,
            Self::FeedNotFound { .. } | Self::FeedAlreadyOpen { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_feed_not_found_display() {
        let err = Error::feed_not_found("shell-99");
        assert_eq!(err.to_string(), "Feed not found: shell-99");
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let closed_err = Error::ConnectionClosed;
        let other_err = Error::config("test");

        assert!(conn_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_is_feed_error() {
        assert!(Error::feed_not_found("a").is_feed_error());
        assert!(Error::feed_already_open("a").is_feed_error());
        assert!(!Error::ConnectionClosed.is_feed_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
