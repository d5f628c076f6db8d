//! Socket lifecycle state.

use std::fmt;

/// Lifecycle of a socket.
///
/// Moves forward only: `Connecting → Open → Closed`, or straight from
/// `Connecting` to `Closed` when the transport never opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketState {
    /// Handshake in progress; sends are queued.
    Connecting,
    /// Transport is writable; queued sends are flowing.
    Open,
    /// Terminal.
    Closed,
}

impl SocketState {
    /// Returns `true` when the socket is open.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` when the socket is closed.
    #[inline]
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if moving to `next` is a valid forward step.
    #[inline]
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open) | (Self::Connecting | Self::Open, Self::Closed)
        )
    }
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}
