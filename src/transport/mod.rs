//! Transport capability layer.
//!
//! A transport is the connection primitive underneath a [`Socket`]: it
//! performs the handshake, moves bytes, and raises open/message/close
//! notifications. The socket only talks to it through the [`Transport`]
//! trait, so any implementation can be plugged in.
//!
//! [`Socket`]: crate::Socket
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   add_listener / events    ┌─────────────────┐
//! │  Socket         │◄───────────────────────────│  Transport      │
//! │                 │                            │                 │
//! │  dispatch task  │───────────────────────────►│  WsTransport    │
//! └─────────────────┘   send / close             └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Event types and the listener registry |
//! | `websocket` | WebSocket transport on `tokio-tungstenite` |

// ============================================================================
// Submodules
// ============================================================================

/// Transport events and listener registry.
pub mod event;

/// WebSocket transport.
pub mod websocket;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::frame::Frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{CloseEvent, EventKind, Listener, Listeners, TransportEvent};
pub use websocket::WsTransport;

// ============================================================================
// Transport
// ============================================================================

/// Capability interface consumed by the socket core.
///
/// Implementations are constructed by their own constructor (for example
/// [`WsTransport::new`]) and must start delivering events without further
/// calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Asks the transport to surface binary payloads as [`Frame::Binary`].
    ///
    /// When disabled, binary payloads may be delivered as text.
    fn set_binary_preference(&self, prefer_binary: bool);

    /// Subscribes a listener to one kind of notification.
    fn add_listener(&self, kind: EventKind, listener: Listener);

    /// Writes one frame. Resolves once the transport accepted or rejected it.
    async fn send(&self, frame: Frame) -> Result<()>;

    /// Starts closing the transport.
    ///
    /// Does not wait for the close notification. Returns an error if the
    /// transport is already closing or closed.
    async fn close(&self) -> Result<()>;
}
