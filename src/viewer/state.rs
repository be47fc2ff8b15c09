//! User-facing connection status.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// DisplayState
// ============================================================================

/// The reduced, user-facing connection status.
///
/// Exactly one state is active at any time. The state is derived from the
/// most recent transport lifecycle event plus the fixed close-code table;
/// there is no hidden state beyond which event was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    /// Connection attempt in progress.
    #[default]
    Connecting,

    /// Subscribed and receiving.
    Connected,

    /// The session ended unremarkably. Recoverable by starting a new
    /// session only.
    Disconnected,

    /// The session ended with a specific, server-supplied condition.
    /// Carries reason text in the status indicator.
    Error,
}

impl DisplayState {
    /// Returns `true` for states no event can leave, other than the
    /// error-upgrade rule.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }

    /// Stable lowercase name, suitable for status labels.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
