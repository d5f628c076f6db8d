//! Socket core: event wiring, readiness gate and dispatch loop.
//!
//! # Dispatch Loop
//!
//! Each socket spawns one tokio task that:
//!
//! - Waits for the readiness gate (state leaves `Connecting`)
//! - Drains the send queue in FIFO order through [`Transport::send`]
//! - Stops when the state becomes `Closed`, the socket is dropped,
//!   or a send fails
//!
//! Transport events are handled on whatever task the transport raises them
//! from; they only touch the state channel and the user's handlers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::transport::{CloseEvent, EventKind, Listener, Transport, TransportEvent, WsTransport};

use super::options::{ErrorHandler, Handler, Options};
use super::state::SocketState;

// ============================================================================
// Inner
// ============================================================================

/// State shared by the socket handle, transport listeners and the
/// dispatch task. Only the handle holds it strongly.
struct Inner {
    /// Exclusively owned transport.
    transport: Arc<dyn Transport>,
    /// Lifecycle state; doubles as readiness gate and cancellation signal.
    state_tx: watch::Sender<SocketState>,
    on_message: Option<Handler>,
    on_close: Option<Handler>,
    on_error: Option<ErrorHandler>,
    /// Set once `on_close` has been considered.
    close_notified: AtomicBool,
}

impl Inner {
    fn state(&self) -> SocketState {
        *self.state_tx.borrow()
    }

    /// Moves the state forward. Returns `false` if `next` is not reachable.
    fn transition(&self, next: SocketState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                trace!(from = %state, to = %next, "Socket state change");
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Builds the listener registered for every transport event kind.
    fn listener(inner: &Arc<Self>) -> Listener {
        let weak = Arc::downgrade(inner);
        Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(event);
            }
        })
    }

    fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Message(frame) => self.handle_message(frame),
            TransportEvent::Open => self.handle_open(),
            TransportEvent::Close(close) => self.handle_close(close),
        }
    }

    fn handle_message(&self, frame: Frame) {
        let bytes = frame.into_bytes();
        trace!(len = bytes.len(), "Message received");

        if let Some(ref handler) = self.on_message {
            handler(bytes);
        }
    }

    fn handle_open(&self) {
        if self.transition(SocketState::Open) {
            debug!("Socket open, releasing queued sends");
        } else {
            debug!(state = %self.state(), "Ignoring open notification");
        }
    }

    fn handle_close(&self, close: CloseEvent) {
        debug!(code = ?close.code, "Transport closed");
        self.transition(SocketState::Closed);
        self.notify_close(close.into_bytes());
    }

    /// Degrades the socket after a send failure.
    fn fail(&self, err: Error) {
        error!(error = %err, "Send failed, closing socket");
        self.transition(SocketState::Closed);

        if let Some(ref handler) = self.on_error {
            handler(err);
        }

        self.notify_close(Vec::new());
    }

    /// Invokes `on_close` unless it already ran.
    fn notify_close(&self, payload: Vec<u8>) {
        if self.close_notified.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(ref handler) = self.on_close {
            handler(payload);
        }
    }
}

// ============================================================================
// Socket
// ============================================================================

/// Callback-driven message socket.
///
/// Sends are queued until the transport opens, then written in call order
/// by a single dispatch task. Inbound frames reach `on_message` as bytes.
///
/// # Example
///
/// ```ignore
/// use socrates::{Options, Socket};
///
/// let socket = Socket::open(
///     "ws://127.0.0.1:9001",
///     Options::new().with_on_message(|bytes| println!("{bytes:?}")),
/// )?;
/// socket.send("hello");
/// socket.close().await?;
/// ```
pub struct Socket {
    inner: Arc<Inner>,
    /// Send queue drained by the dispatch task.
    queue_tx: mpsc::UnboundedSender<Frame>,
}

impl Socket {
    /// Opens a WebSocket to `address`.
    ///
    /// Returns immediately in the `Connecting` state; whether the
    /// connection succeeds is reported through the handlers.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if `address` is not a `ws`/`wss` URL
    /// - [`Error::Connection`] if called outside a tokio runtime
    pub fn open(address: &str, options: Options) -> Result<Self> {
        let transport = WsTransport::new(address)?;
        Self::with_transport(transport, options)
    }

    /// Wires a socket onto a transport, taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if called outside a tokio runtime.
    pub fn with_transport<T>(transport: T, options: Options) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let runtime = Handle::try_current()
            .map_err(|_| Error::connection("no tokio runtime available for the dispatch task"))?;

        let Options {
            on_message,
            on_close,
            on_error,
            prefer_binary,
        } = options;

        let (state_tx, state_rx) = watch::channel(SocketState::Connecting);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            transport: Arc::clone(&transport),
            state_tx,
            on_message,
            on_close,
            on_error,
            close_notified: AtomicBool::new(false),
        });

        runtime.spawn(Self::run_dispatch_loop(
            Arc::clone(&transport),
            queue_rx,
            state_rx,
            Arc::downgrade(&inner),
        ));

        transport.set_binary_preference(prefer_binary);
        for kind in EventKind::ALL {
            transport.add_listener(kind, Inner::listener(&inner));
        }

        debug!("Socket created");

        Ok(Self { inner, queue_tx })
    }

    /// Queues a text frame. Never blocks.
    ///
    /// Frames queued after the socket closed are dropped.
    pub fn send(&self, data: impl Into<String>) {
        self.enqueue(Frame::Text(data.into()));
    }

    /// Queues a binary frame. Never blocks.
    pub fn send_binary(&self, data: impl Into<Vec<u8>>) {
        self.enqueue(Frame::Binary(data.into()));
    }

    /// Closes the socket and asks the transport to close.
    ///
    /// The dispatch task stops immediately; frames still queued are
    /// dropped. `on_close` fires later, from the transport's close event.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket is already closed
    /// - Any error the transport reports while closing
    pub async fn close(&self) -> Result<()> {
        if !self.inner.transition(SocketState::Closed) {
            return Err(Error::ConnectionClosed);
        }

        debug!("Closing socket");
        self.inner.transport.close().await
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SocketState {
        self.inner.state()
    }

    /// Returns `true` while the socket is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    fn enqueue(&self, frame: Frame) {
        if self.state().is_closed() {
            debug!(len = frame.len(), "Socket closed, dropping frame");
            return;
        }

        if self.queue_tx.send(frame).is_err() {
            debug!("Dispatch loop stopped, dropping frame");
        }
    }

    /// Dispatch loop that owns all writes to the transport.
    async fn run_dispatch_loop(
        transport: Arc<dyn Transport>,
        mut queue_rx: mpsc::UnboundedReceiver<Frame>,
        mut state_rx: watch::Receiver<SocketState>,
        inner: Weak<Inner>,
    ) {
        let ready = state_rx
            .wait_for(|state| *state != SocketState::Connecting)
            .await
            .map(|state| state.is_open())
            .unwrap_or(false);

        if !ready {
            debug!("Socket closed before opening, dispatch loop exiting");
            return;
        }

        trace!("Dispatch loop started");

        loop {
            tokio::select! {
                biased;

                // Close or drop of the socket
                changed = state_rx.changed() => {
                    if changed.is_err() || state_rx.borrow_and_update().is_closed() {
                        break;
                    }
                }

                // Queued frames
                frame = queue_rx.recv() => {
                    let Some(frame) = frame else {
                        debug!("Send queue closed");
                        break;
                    };

                    trace!(len = frame.len(), "Dispatching frame");

                    if let Err(e) = transport.send(frame).await {
                        if state_rx.borrow().is_closed() {
                            debug!(error = %e, "Send failed on closed socket");
                            break;
                        }

                        // Transport went away without an error of its own;
                        // its close event normally got here first.
                        if matches!(e, Error::ConnectionClosed) {
                            debug!("Transport closed under a pending send");
                            if let Some(inner) = inner.upgrade() {
                                inner.transition(SocketState::Closed);
                                inner.notify_close(Vec::new());
                            }
                            break;
                        }

                        if let Some(inner) = inner.upgrade() {
                            inner.fail(Error::send_dispatch(e.to_string()));
                        }

                        if let Err(close_err) = transport.close().await {
                            debug!(error = %close_err, "Transport close after send failure");
                        }
                        break;
                    }
                }
            }
        }

        queue_rx.close();
        let mut dropped = 0usize;
        while queue_rx.try_recv().is_ok() {
            dropped += 1;
        }

        if dropped > 0 {
            debug!(count = dropped, "Dropped unsent frames");
        }

        debug!("Dispatch loop terminated");
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
