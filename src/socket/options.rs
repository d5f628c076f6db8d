//! Socket handlers and configuration.
//!
//! # Example
//!
//! ```ignore
//! use socrates::Options;
//!
//! let options = Options::new()
//!     .with_on_message(|bytes| println!("got {} bytes", bytes.len()))
//!     .with_on_close(|_| println!("closed"))
//!     .with_on_error(|e| eprintln!("socket error: {e}"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::Error;

// ============================================================================
// Types
// ============================================================================

/// Byte handler callback type.
///
/// Receives one normalized payload per call.
pub type Handler = Box<dyn Fn(Vec<u8>) + Send + Sync>;

/// Error handler callback type.
///
/// Receives errors discovered by the dispatch task.
pub type ErrorHandler = Box<dyn Fn(Error) + Send + Sync>;

// ============================================================================
// Options
// ============================================================================

/// Callbacks and settings applied when a socket is opened.
///
/// Every handler is optional. Handlers run on the transport's event task
/// (or the dispatch task for errors) and should return quickly.
pub struct Options {
    /// Invoked once per inbound frame with its bytes.
    pub on_message: Option<Handler>,

    /// Invoked at most once when the socket closes, with the close payload.
    pub on_close: Option<Handler>,

    /// Invoked when a queued frame could not be sent.
    pub on_error: Option<ErrorHandler>,

    /// Ask the transport to deliver binary frames as bytes. Defaults to `true`.
    pub prefer_binary: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl Options {
    /// Creates options with no handlers and binary preference on.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            on_message: None,
            on_close: None,
            on_error: None,
            prefer_binary: true,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Options {
    /// Sets the message handler.
    #[inline]
    #[must_use]
    pub fn with_on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        self.on_message = Some(Box::new(handler));
        self
    }

    /// Sets the close handler.
    #[inline]
    #[must_use]
    pub fn with_on_close<F>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        self.on_close = Some(Box::new(handler));
        self
    }

    /// Sets the error handler.
    #[inline]
    #[must_use]
    pub fn with_on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Sets the binary preference forwarded to the transport.
    #[inline]
    #[must_use]
    pub fn with_prefer_binary(mut self, prefer_binary: bool) -> Self {
        self.prefer_binary = prefer_binary;
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("on_message", &self.on_message.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("prefer_binary", &self.prefer_binary)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
