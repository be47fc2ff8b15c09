//! Transport lifecycle events consumed by the state machine.
//!
//! [`ViewerSession`](crate::viewer::ViewerSession) normalizes platform
//! behavior into this tagged union so the controller can be driven with
//! synthetic events in tests, without a live connection.
//!
//! Events for one session arrive in strict order:
//! `Opened` (at most once), then zero or more `Message`, optionally one
//! data-less `TransportError`, terminated by exactly one `Closed`.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::CloseEvent;
use crate::viewer::DisplayState;

// ============================================================================
// SessionEvent
// ============================================================================

/// One lifecycle event from the transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The connection completed its handshake.
    Opened,

    /// One inbound chunk of raw feed bytes.
    ///
    /// Chunk boundaries are arbitrary: a multi-byte UTF-8 sequence may be
    /// split across consecutive messages.
    Message(Vec<u8>),

    /// The connection ended. Carries the close code and reason, if any.
    Closed(CloseEvent),

    /// A transport-level failure with no structured payload.
    ///
    /// Some platforms report this immediately before the close event that
    /// carries the actual code; others never produce it. The controller
    /// unifies both shapes.
    TransportError,
}

// ============================================================================
// Step
// ============================================================================

/// Outcome of feeding one event through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Display state after the transition.
    pub state: DisplayState,

    /// Whether the feed id must now be sent as the subscription frame.
    ///
    /// Set on the first `Opened` event only.
    pub subscribe: bool,
}

impl Step {
    /// A transition with no subscription side effect.
    #[inline]
    pub(crate) fn stay(state: DisplayState) -> Self {
        Self {
            state,
            subscribe: false,
        }
    }

    /// The transition that triggers the subscription frame.
    #[inline]
    pub(crate) fn subscribe(state: DisplayState) -> Self {
        Self {
            state,
            subscribe: true,
        }
    }
}
