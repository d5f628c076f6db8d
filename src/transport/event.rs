//! Transport events and the listener registry.
//!
//! Transports announce lifecycle changes and inbound data as
//! [`TransportEvent`]s. Consumers subscribe per [`EventKind`].
//!
//! # Delivery Rules
//!
//! - Listeners of one kind are invoked in registration order.
//! - Events emitted while no listener of their kind is registered are
//!   held and replayed, oldest first, to the first listener that arrives.
//!   At most [`MAX_HELD_EVENTS`] are held per kind; later ones are dropped.
//! - Listeners run while the registry lock is held, so they must not
//!   register listeners or emit on the same registry.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::frame::Frame;

// ============================================================================
// Types
// ============================================================================

/// Events held per kind while no listener is registered.
pub const MAX_HELD_EVENTS: usize = 1024;

/// Listener callback type.
///
/// Called with every event of the kind it was registered for.
pub type Listener = Arc<dyn Fn(TransportEvent) + Send + Sync>;

// ============================================================================
// EventKind
// ============================================================================

/// The notifications a transport can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An inbound frame arrived.
    Message,
    /// The handshake completed and the transport is writable.
    Open,
    /// The transport is closed.
    Close,
}

impl EventKind {
    /// All kinds, in the order a socket subscribes to them.
    pub const ALL: [Self; 3] = [Self::Message, Self::Open, Self::Close];

    /// Returns the wire-style event name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Open => "open",
            Self::Close => "close",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Message => 0,
            Self::Open => 1,
            Self::Close => 2,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CloseEvent
// ============================================================================

/// Data attached to a close notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close status code, if the peer sent one.
    pub code: Option<u16>,
    /// Close reason, if any.
    pub payload: Option<Frame>,
}

impl CloseEvent {
    /// Status code for connections that ended without a close handshake.
    pub const ABNORMAL: u16 = 1006;

    /// Creates a close event with a code and text reason.
    ///
    /// An empty reason is stored as no payload.
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            code: Some(code),
            payload: (!reason.is_empty()).then_some(Frame::Text(reason)),
        }
    }

    /// Creates the event reported when a connection drops without a close
    /// handshake.
    #[inline]
    #[must_use]
    pub fn abnormal() -> Self {
        Self {
            code: Some(Self::ABNORMAL),
            payload: None,
        }
    }

    /// Normalizes the payload to bytes; empty when there is none.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.payload.map(Frame::into_bytes).unwrap_or_default()
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// A notification raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Inbound frame.
    Message(Frame),
    /// Handshake completed.
    Open,
    /// Transport closed.
    Close(CloseEvent),
}

impl TransportEvent {
    /// Returns the kind listeners subscribe to for this event.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::Message,
            Self::Open => EventKind::Open,
            Self::Close(_) => EventKind::Close,
        }
    }
}

// ============================================================================
// Listeners
// ============================================================================

#[derive(Default)]
struct Slot {
    listeners: Vec<Listener>,
    pending: Vec<TransportEvent>,
}

/// Per-kind listener registry shared by transport implementations.
#[derive(Default)]
pub struct Listeners {
    slots: Mutex<[Slot; 3]>,
}

impl Listeners {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and replays any events held for its kind.
    pub fn add(&self, kind: EventKind, listener: Listener) {
        let mut slots = self.slots.lock();
        let slot = &mut slots[kind.index()];
        slot.listeners.push(Arc::clone(&listener));

        let held = mem::take(&mut slot.pending);
        if !held.is_empty() {
            trace!(%kind, count = held.len(), "Replaying held events");
        }
        for event in held {
            listener(event);
        }
    }

    /// Delivers an event to every listener of its kind.
    pub fn emit(&self, event: TransportEvent) {
        let kind = event.kind();
        let mut slots = self.slots.lock();
        let slot = &mut slots[kind.index()];

        if slot.listeners.is_empty() {
            if slot.pending.len() >= MAX_HELD_EVENTS {
                warn!(%kind, limit = MAX_HELD_EVENTS, "Held event limit reached, dropping event");
                return;
            }
            trace!(%kind, "No listener yet, holding event");
            slot.pending.push(event);
            return;
        }

        for listener in &slot.listeners {
            listener(event.clone());
        }
    }

    /// Returns the number of listeners registered for a kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.slots.lock()[kind.index()].listeners.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("Listeners")
            .field("message", &slots[0].listeners.len())
            .field("open", &slots[1].listeners.len())
            .field("close", &slots[2].listeners.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
