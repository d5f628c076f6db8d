//! Socrates - callback-driven, byte-oriented WebSocket client.
//!
//! A [`Socket`] wraps a transport behind a small lifecycle:
//! `Connecting → Open → Closed`. Sends are fire-and-forget and queued until
//! the transport opens; inbound frames, text or binary, reach the
//! `on_message` handler as bytes.
//!
//! # Quick Start
//!
//! ```no_run
//! use socrates::{Options, Result, Socket};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let socket = Socket::open(
//!         "ws://127.0.0.1:9001",
//!         Options::new()
//!             .with_on_message(|bytes| println!("{}", String::from_utf8_lossy(&bytes)))
//!             .with_on_close(|_| println!("closed")),
//!     )?;
//!
//!     // Queued until the handshake completes
//!     socket.send("hello");
//!
//!     socket.close().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`frame`] | Text/binary frames and byte normalization |
//! | [`socket`] | [`Socket`], [`Options`], [`SocketState`] |
//! | [`transport`] | [`Transport`] trait and [`WsTransport`] |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Frame type and byte normalization.
pub mod frame;

/// Socket handle, handlers and lifecycle.
pub mod socket;

/// Transport capability and WebSocket implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use frame::Frame;
pub use socket::{ErrorHandler, Handler, Options, Socket, SocketState};
pub use transport::{CloseEvent, EventKind, Transport, TransportEvent, WsTransport};
