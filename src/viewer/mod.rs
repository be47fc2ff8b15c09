//! Feed-viewing client: transport session and status state machine.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  SessionEvent  ┌────────────────┐  decoded text   ┌─────────────┐
//! │ ViewerSession │───────────────►│   FeedViewer   │────────────────►│ RenderSink  │
//! │  (WebSocket)  │                │ (state machine)│                 └─────────────┘
//! └───────────────┘                │                │  DisplayState   ┌─────────────┐
//!                                  │                │────────────────►│  Status     │
//!                                  └────────────────┘   + reason      │  Indicator  │
//!                                                                     └─────────────┘
//! ```
//!
//! Data flows one way: the session emits lifecycle events, the controller
//! classifies them into a [`DisplayState`] and drives the two output
//! seams. Nothing flows back from the sink (the viewer is read-only).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `controller` | The feed-viewing state machine |
//! | `decoder` | Incremental UTF-8 decoding across chunk boundaries |
//! | `event` | Transport lifecycle events and transition outcomes |
//! | `session` | WebSocket transport session |
//! | `sink` | Render sink and status indicator seams |
//! | `state` | User-facing connection status |

// ============================================================================
// Submodules
// ============================================================================

/// The feed-viewing state machine.
pub mod controller;

/// Incremental UTF-8 decoding across chunk boundaries.
pub mod decoder;

/// Transport lifecycle events and transition outcomes.
pub mod event;

/// WebSocket transport session.
pub mod session;

/// Render sink and status indicator seams.
pub mod sink;

/// User-facing connection status.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use controller::FeedViewer;
pub use decoder::StreamDecoder;
pub use event::{SessionEvent, Step};
pub use session::ViewerSession;
pub use sink::{LogIndicator, RenderSink, StatusIndicator, TtySink};
pub use state::DisplayState;
