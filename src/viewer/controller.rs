//! The feed-viewing state machine.
//!
//! [`FeedViewer`] reduces the transport's lifecycle events into a
//! [`DisplayState`] and applies each transition to its two collaborators:
//! the render sink (decoded output, cursor animation) and the status
//! indicator (state label plus reason text).
//!
//! # Transition table
//!
//! | Current | Event | Next |
//! |---------|-------|------|
//! | connecting | opened | connected (sends the feed id, once) |
//! | connected | message | connected (decode, forward to sink) |
//! | connected | closed, ordinary code | disconnected |
//! | connecting/connected | closed, 4001 or 4002 | error (with reason) |
//! | any | transport error | error (reason from paired close, if any) |
//!
//! A transport error may be followed by the close event that carries the
//! actual code and reason. The error transition is applied immediately and
//! a transient pending flag lets the paired close fill in the reason;
//! an ordinary close never downgrades `error` back to `disconnected`.

// ============================================================================
// Imports
// ============================================================================

use std::mem;

use crate::identifiers::FeedId;
use crate::protocol::CloseEvent;
use crate::viewer::{DisplayState, RenderSink, SessionEvent, StatusIndicator, Step, StreamDecoder};

// ============================================================================
// FeedViewer
// ============================================================================

/// Controller for one feed-viewing session.
///
/// Owns the render sink and status indicator exclusively; all mutation
/// happens from the single event-handling context, driven through
/// [`FeedViewer::handle_event`].
#[derive(Debug)]
pub struct FeedViewer<S, I> {
    feed_id: FeedId,
    sink: S,
    indicator: I,
    decoder: StreamDecoder,
    state: DisplayState,
    reason: String,
    subscribed: bool,
    pending_error: bool,
}

impl<S: RenderSink, I: StatusIndicator> FeedViewer<S, I> {
    /// Creates a controller in the `connecting` state.
    ///
    /// The initial state is applied to the indicator immediately.
    pub fn new(feed_id: FeedId, sink: S, mut indicator: I) -> Self {
        indicator.set_state(DisplayState::Connecting, "");
        Self {
            feed_id,
            sink,
            indicator,
            decoder: StreamDecoder::new(),
            state: DisplayState::Connecting,
            reason: String::new(),
            subscribed: false,
            pending_error: false,
        }
    }

    /// The feed this viewer is subscribed to.
    #[inline]
    #[must_use]
    pub fn feed_id(&self) -> &FeedId {
        &self.feed_id
    }

    /// Current display state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Current reason text. Non-empty only in the `error` state, and
    /// possibly empty even then.
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Feeds one transport event through the state machine.
    ///
    /// Returns the resulting [`Step`]; when `step.subscribe` is set the
    /// caller must send [`FeedViewer::feed_id`] as the session's sole
    /// outbound frame.
    pub fn handle_event(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::Opened => self.on_opened(),
            SessionEvent::Message(bytes) => self.on_message(&bytes),
            SessionEvent::Closed(close) => self.on_closed(close),
            SessionEvent::TransportError => self.on_transport_error(),
        }
    }

    /// Settles the machine when the event stream ends.
    ///
    /// A pending transport error keeps its `error` state with empty
    /// reason; a session that never observed a close settles as
    /// `disconnected`.
    pub fn finalize(&mut self) -> DisplayState {
        self.pending_error = false;
        if !self.state.is_terminal() {
            self.apply(DisplayState::Disconnected, String::new());
        }
        self.state
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn on_opened(&mut self) -> Step {
        if self.state.is_terminal() || self.subscribed {
            // A duplicate open must not resubscribe.
            return Step::stay(self.state);
        }
        self.subscribed = true;
        self.apply(DisplayState::Connected, String::new());
        Step::subscribe(self.state)
    }

    fn on_message(&mut self, bytes: &[u8]) -> Step {
        if self.state != DisplayState::Connected {
            return Step::stay(self.state);
        }
        let text = self.decoder.decode(bytes);
        if !text.is_empty() {
            self.sink.write(&text);
        }
        Step::stay(self.state)
    }

    fn on_closed(&mut self, close: CloseEvent) -> Step {
        if self.state == DisplayState::Connected {
            let tail = self.decoder.finish();
            if !tail.is_empty() {
                self.sink.write(&tail);
            }
        }

        let was_pending = mem::take(&mut self.pending_error);
        if close.class().is_rejection() {
            // Authoritative even after a preceding transport error or an
            // earlier ordinary settle; reapplying is idempotent.
            self.apply(DisplayState::Error, close.reason);
        } else if self.state == DisplayState::Error {
            if was_pending {
                // The paired close supplies the missing reason text.
                self.apply(DisplayState::Error, close.reason);
            }
            // Never downgrade error to disconnected.
        } else {
            self.apply(DisplayState::Disconnected, String::new());
        }
        Step::stay(self.state)
    }

    fn on_transport_error(&mut self) -> Step {
        if self.state != DisplayState::Error {
            self.pending_error = true;
            self.apply(DisplayState::Error, String::new());
        }
        Step::stay(self.state)
    }

    /// Applies a state change to both collaborators.
    fn apply(&mut self, next: DisplayState, reason: String) {
        if next.is_terminal() {
            self.sink.set_cursor_blink(false);
        }
        self.state = next;
        self.reason = if next == DisplayState::Error {
            reason
        } else {
            String::new()
        };
        self.indicator.set_state(next, &self.reason);
    }
}

// ============================================================================
// Tests
// ============================================================================
