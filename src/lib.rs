//! termfeed - live terminal-feed viewing over WebSocket.
//!
//! A producer pipes terminal output into the feed server; any number of
//! viewers subscribe to the resulting feed by name and watch it live. This
//! crate provides both halves:
//!
//! - **Viewer**: one WebSocket session per viewing attempt, reduced by a
//!   small state machine into a user-facing display state
//!   (`connecting` / `connected` / `disconnected` / `error`).
//! - **Server**: TCP ingest for producers, an in-memory hub, and a
//!   WebSocket fan-out endpoint that enforces per-feed viewer caps.
//!
//! The wire protocol is deliberately tiny: the viewer's sole outbound
//! frame is the feed id, inbound frames are raw terminal bytes, and the
//! close frame carries the outcome. Reserved close codes (`4001` too many
//! peers, `4002` feed not found) let viewers surface a specific reason
//! instead of a generic "disconnected" label.
//!
//! # Quick Start
//!
//! ```no_run
//! use termfeed::{FeedId, FeedViewer, LogIndicator, TtySink, ViewerConfig, ViewerSession};
//!
//! #[tokio::main]
//! async fn main() -> termfeed::Result<()> {
//!     let config = ViewerConfig::default().with_host("feeds.example.com");
//!     let feed_id = FeedId::new("shell-17")?;
//!
//!     let mut session = ViewerSession::open(&config.endpoint()?).await?;
//!     let mut viewer = FeedViewer::new(feed_id, TtySink::new(), LogIndicator::new());
//!
//!     while let Some(event) = session.next_event().await {
//!         let step = viewer.handle_event(event);
//!         if step.subscribe {
//!             let feed_id = viewer.feed_id().to_string();
//!             session.send(&feed_id).await?;
//!         }
//!     }
//!     viewer.finalize();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Environment-driven configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe feed ids |
//! | [`protocol`] | Close codes and endpoint path |
//! | [`server`] | Ingest, hub, and fan-out servers |
//! | [`viewer`] | Transport session and status state machine |

// ============================================================================
// Modules
// ============================================================================

/// Environment-driven configuration.
///
/// Defaults suit local use; every field has a `TERMFEED_*` override.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe feed identifiers.
pub mod identifiers;

/// Wire protocol: close codes and the fixed endpoint path.
pub mod protocol;

/// Feed server: TCP ingest, hub, WebSocket fan-out.
pub mod server;

/// Feed-viewing client: transport session and status state machine.
pub mod viewer;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{Config, ServerConfig, ViewerConfig};

// Error types
pub use error::{Error, Result};

// Identifiers
pub use identifiers::FeedId;

// Protocol types
pub use protocol::{CloseClass, CloseEvent, CloseReason};

// Server types
pub use server::{FanoutServer, Hub, IngestServer, MemoryHub, PeerLimiter};

// Viewer types
pub use viewer::{
    DisplayState, FeedViewer, LogIndicator, RenderSink, SessionEvent, StatusIndicator, Step,
    StreamDecoder, TtySink, ViewerSession,
};
