//! Test transports: an in-memory mock and loopback WebSocket servers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::error::{Error, Result};
use crate::frame::Frame;

use super::Transport;
use super::event::{CloseEvent, EventKind, Listener, Listeners, TransportEvent};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// MockTransport
// ============================================================================

/// State shared by the transport half and the peer half.
struct MockState {
    listeners: Listeners,
    prefer_binary: AtomicBool,
    closed: AtomicBool,
    fail_sends: AtomicBool,
    close_calls: AtomicUsize,
    /// Close event raised from inside the next `send`.
    close_on_send: Mutex<Option<CloseEvent>>,
    sent: Mutex<Vec<Frame>>,
    sent_tx: mpsc::UnboundedSender<Frame>,
}

/// Transport half, handed to the socket.
pub(crate) struct MockTransport {
    state: Arc<MockState>,
}

/// Peer half, kept by the test to raise events and observe writes.
pub(crate) struct MockPeer {
    state: Arc<MockState>,
    sent_rx: mpsc::UnboundedReceiver<Frame>,
}

impl MockTransport {
    pub(crate) fn new() -> (Self, MockPeer) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let state = Arc::new(MockState {
            listeners: Listeners::new(),
            prefer_binary: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            close_on_send: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            sent_tx,
        });
        let peer = MockPeer {
            state: Arc::clone(&state),
            sent_rx,
        };
        (Self { state }, peer)
    }
}

impl MockPeer {
    pub(crate) fn emit(&self, event: TransportEvent) {
        self.state.listeners.emit(event);
    }

    pub(crate) fn open(&self) {
        self.emit(TransportEvent::Open);
    }

    pub(crate) fn message(&self, frame: Frame) {
        self.emit(TransportEvent::Message(frame));
    }

    pub(crate) fn remote_close(&self, event: CloseEvent) {
        self.state.closed.store(true, Ordering::SeqCst);
        self.emit(TransportEvent::Close(event));
    }

    pub(crate) fn fail_sends(&self) {
        self.state.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Makes the next send race a remote close: the close event is raised
    /// and the send is answered with [`Error::ConnectionClosed`].
    pub(crate) fn close_during_next_send(&self, event: CloseEvent) {
        *self.state.close_on_send.lock() = Some(event);
    }

    pub(crate) fn sent(&self) -> Vec<Frame> {
        self.state.sent.lock().clone()
    }

    /// Waits for the next successful send.
    pub(crate) async fn next_sent(&mut self) -> Frame {
        timeout(WAIT, self.sent_rx.recv())
            .await
            .expect("frame should be dispatched")
            .expect("mock channel open")
    }

    pub(crate) fn prefers_binary(&self) -> bool {
        self.state.prefer_binary.load(Ordering::SeqCst)
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn listener_count(&self, kind: EventKind) -> usize {
        self.state.listeners.count(kind)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn set_binary_preference(&self, prefer_binary: bool) {
        self.state
            .prefer_binary
            .store(prefer_binary, Ordering::SeqCst);
    }

    fn add_listener(&self, kind: EventKind, listener: Listener) {
        self.state.listeners.add(kind, listener);
    }

    async fn send(&self, frame: Frame) -> Result<()> {
        let racing_close = self.state.close_on_send.lock().take();
        if let Some(event) = racing_close {
            self.state.closed.store(true, Ordering::SeqCst);
            self.state.listeners.emit(TransportEvent::Close(event));
            return Err(Error::ConnectionClosed);
        }
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        if self.state.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::connection("broken pipe"));
        }
        self.state.sent.lock().push(frame.clone());
        let _ = self.state.sent_tx.send(frame);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.closed.swap(true, Ordering::SeqCst) {
            return Err(Error::close("transport is already closing or closed"));
        }
        Ok(())
    }
}

// ============================================================================
// Loopback Servers
// ============================================================================

/// Accepts one connection and echoes text and binary frames back.
pub(crate) async fn spawn_echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade");

        while let Some(Ok(message)) = ws.next().await {
            if (message.is_text() || message.is_binary()) && ws.send(message).await.is_err() {
                break;
            }
        }
    });

    format!("ws://{addr}")
}

/// Accepts one connection, reads one data frame, then closes with
/// `1000` and `reason` while the client may still be writing.
pub(crate) async fn spawn_closing_server(reason: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade");

        while let Some(Ok(message)) = ws.next().await {
            if message.is_text() || message.is_binary() {
                break;
            }
        }

        let _ = ws
            .close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: reason.into(),
            }))
            .await;

        // Drain until the client acknowledges the close
        while let Some(Ok(_)) = ws.next().await {}
    });

    format!("ws://{addr}")
}
