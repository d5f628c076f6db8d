//! Callback-driven socket built on a [`Transport`].
//!
//! [`Transport`]: crate::transport::Transport
//!
//! # Lifecycle
//!
//! 1. `Socket::open` / `Socket::with_transport` - register listeners, spawn dispatch task
//! 2. Transport `open` event - readiness gate opens, queued sends flow
//! 3. `Socket::send` - frames queued and written in call order
//! 4. Transport `close` event or `Socket::close` - socket closed, dispatch task stops
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Socket handle, event wiring and dispatch loop |
//! | `options` | Handlers and configuration |
//! | `state` | Lifecycle state |

// ============================================================================
// Submodules
// ============================================================================

/// Socket handle and dispatch loop.
pub mod core;

/// Handlers and configuration.
pub mod options;

/// Lifecycle state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Socket;
pub use options::{ErrorHandler, Handler, Options};
pub use state::SocketState;
