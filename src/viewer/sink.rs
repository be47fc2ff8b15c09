//! Output seams: the render sink and the status indicator.
//!
//! The terminal-rendering surface and the status display are external
//! collaborators. The controller only ever needs two capabilities from the
//! renderer (accept decoded text, suspend cursor animation) and one from
//! the status display (show the current state, with reason text for
//! errors), so both are traits and the controller takes them as explicit
//! dependencies instead of reaching into ambient page or process state.

// ============================================================================
// Imports
// ============================================================================

use std::io::{self, Write};

use tracing::{error, info, warn};

use crate::viewer::DisplayState;

// ============================================================================
// RenderSink
// ============================================================================

/// Surface that renders decoded terminal output.
pub trait RenderSink {
    /// Appends decoded text to the display.
    fn write(&mut self, text: &str);

    /// Enables or disables the cursor-blink animation.
    fn set_cursor_blink(&mut self, enabled: bool);
}

// ============================================================================
// StatusIndicator
// ============================================================================

/// Target that reflects connection health to the user.
pub trait StatusIndicator {
    /// Applies a display state.
    ///
    /// `reason` is non-empty only for [`DisplayState::Error`], and may be
    /// empty even then; implementations must render an empty detail rather
    /// than fail.
    fn set_state(&mut self, state: DisplayState, reason: &str);
}

// ============================================================================
// TtySink
// ============================================================================

/// Render sink backed by the local terminal.
///
/// Forwards feed output to stdout unmodified and maps the cursor-blink
/// flag to the DECSET blinking-cursor sequence.
#[derive(Debug)]
pub struct TtySink {
    out: io::Stdout,
}

impl TtySink {
    /// Creates a sink over stdout.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }

    fn emit(&mut self, bytes: &[u8]) {
        if let Err(e) = self.out.write_all(bytes).and_then(|()| self.out.flush()) {
            warn!(error = %e, "stdout write failed");
        }
    }
}

impl Default for TtySink {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for TtySink {
    fn write(&mut self, text: &str) {
        self.emit(text.as_bytes());
    }

    fn set_cursor_blink(&mut self, enabled: bool) {
        let seq: &[u8] = if enabled { b"\x1b[?12h" } else { b"\x1b[?12l" };
        self.emit(seq);
    }
}

// ============================================================================
// LogIndicator
// ============================================================================

/// Status indicator that reports through the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogIndicator;

impl LogIndicator {
    /// Creates a logging indicator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StatusIndicator for LogIndicator {
    fn set_state(&mut self, state: DisplayState, reason: &str) {
        match state {
            DisplayState::Error if reason.is_empty() => error!(status = %state),
            DisplayState::Error => error!(status = %state, %reason),
            _ => info!(status = %state),
        }
    }
}
