//! Error types for the socket core.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use socrates::{Options, Result, Socket};
//!
//! async fn example() -> Result<()> {
//!     let socket = Socket::open("ws://127.0.0.1:9001", Options::new())?;
//!     socket.send("hello");
//!     socket.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::InvalidAddress`], [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Dispatch | [`Error::SendDispatch`] |
//! | Teardown | [`Error::Close`] |
//! | External | [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Address rejected at construction time.
    ///
    /// Returned when the address is malformed or uses a scheme the
    /// transport cannot speak. No socket is created.
    #[error("Invalid address `{address}`: {message}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        message: String,
    },

    /// Transport could not be created or used.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The socket or transport is already closed.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// The transport rejected a queued frame.
    ///
    /// Raised inside the dispatch task and delivered through the
    /// `on_error` handler, never returned to a caller.
    #[error("Send failed: {message}")]
    SendDispatch {
        /// Description of the transport failure.
        message: String,
    },

    // ========================================================================
    // Teardown Errors
    // ========================================================================
    /// The transport reported an error while closing.
    #[error("Close failed: {message}")]
    Close {
        /// Description of the close failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid address error.
    #[inline]
    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
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

    /// Creates a send dispatch error.
    #[inline]
    pub fn send_dispatch(message: impl Into<String>) -> Self {
        Self::SendDispatch {
            message: message.into(),
        }
    }

    /// Creates a close error.
    #[inline]
    pub fn close(message: impl Into<String>) -> Self {
        Self::Close {
            message: message.into(),
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
            Self::InvalidAddress { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error came out of the dispatch task.
    #[inline]
    #[must_use]
    pub fn is_send_error(&self) -> bool {
        matches!(self, Self::SendDispatch { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
