//! WebSocket transport on `tokio-tungstenite`.
//!
//! [`WsTransport::new`] validates the address and spawns one event-loop
//! task per connection. The loop performs the handshake, then multiplexes
//! inbound frames and outbound commands until the connection ends.
//!
//! # Event Loop
//!
//! ```text
//!   connect_async ──► Open ──► select! { ws_read.next(), command_rx.recv() } ──► Close
//! ```
//!
//! - While connecting, a close request aborts the attempt and sends fail.
//! - Inbound text/binary frames become `message` events.
//! - A close frame, read error, or end of stream stops the loop.
//! - Exactly one `close` event is emitted when the loop stops.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::frame::Frame;

use super::Transport;
use super::event::{CloseEvent, EventKind, Listener, Listeners, TransportEvent};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsSink = SplitSink<WsStream, Message>;

/// Internal commands for the event loop.
enum TransportCommand {
    /// Write a frame and report the outcome.
    Send {
        frame: Frame,
        result_tx: oneshot::Sender<Result<()>>,
    },
    /// Start the close handshake.
    Close { result_tx: oneshot::Sender<Result<()>> },
}

/// State shared between the handle and the event loop.
struct Shared {
    listeners: Listeners,
    prefer_binary: AtomicBool,
    closing: AtomicBool,
}

// ============================================================================
// WsTransport
// ============================================================================

/// WebSocket implementation of [`Transport`].
///
/// Dropping every handle makes the event loop close the connection.
pub struct WsTransport {
    /// Validated `ws://` or `wss://` address.
    url: Url,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    /// Listeners and flags (shared with event loop).
    shared: Arc<Shared>,
}

impl WsTransport {
    /// Validates `address` and starts connecting in the background.
    ///
    /// Returns immediately; the outcome of the handshake is reported
    /// through `open` or `close` events.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if the address is not a `ws`/`wss` URL
    ///   with a host
    /// - [`Error::Connection`] if called outside a tokio runtime
    pub fn new(address: &str) -> Result<Self> {
        let url = parse_address(address)?;
        let runtime = Handle::try_current()
            .map_err(|_| Error::connection("no tokio runtime available to drive the transport"))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            listeners: Listeners::new(),
            prefer_binary: AtomicBool::new(true),
            closing: AtomicBool::new(false),
        });

        runtime.spawn(run_event_loop(url.clone(), command_rx, Arc::clone(&shared)));

        debug!(%url, "WebSocket transport created");

        Ok(Self {
            url,
            command_tx,
            shared,
        })
    }

    /// Returns the address this transport connects to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsTransport")
            .field("url", &self.url.as_str())
            .field("listeners", &self.shared.listeners)
            .field("closing", &self.shared.closing.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn set_binary_preference(&self, prefer_binary: bool) {
        self.shared
            .prefer_binary
            .store(prefer_binary, Ordering::Relaxed);
    }

    fn add_listener(&self, kind: EventKind, listener: Listener) {
        self.shared.listeners.add(kind, listener);
    }

    async fn send(&self, frame: Frame) -> Result<()> {
        let (result_tx, result_rx) = oneshot::channel();

        self.command_tx
            .send(TransportCommand::Send { frame, result_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        result_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    async fn close(&self) -> Result<()> {
        if self.shared.closing.swap(true, Ordering::SeqCst) {
            return Err(Error::close("transport is already closing or closed"));
        }

        let (result_tx, result_rx) = oneshot::channel();

        self.command_tx
            .send(TransportCommand::Close { result_tx })
            .map_err(|_| Error::close("transport event loop has stopped"))?;

        result_rx
            .await
            .map_err(|_| Error::close("transport event loop has stopped"))?
    }
}

// ============================================================================
// Address Validation
// ============================================================================

/// Parses and validates a WebSocket address.
fn parse_address(address: &str) -> Result<Url> {
    let url = Url::parse(address).map_err(|e| Error::invalid_address(address, e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::invalid_address(
                address,
                format!("unsupported scheme `{other}`, expected `ws` or `wss`"),
            ));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_address(address, "missing host"));
    }

    Ok(url)
}

// ============================================================================
// Event Loop
// ============================================================================

/// Event loop that owns the WebSocket for its whole life.
async fn run_event_loop(
    url: Url,
    mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    shared: Arc<Shared>,
) {
    let Some(ws_stream) = connect(&url, &mut command_rx).await else {
        finish(&shared, command_rx, CloseEvent::abnormal());
        return;
    };

    let (mut ws_write, mut ws_read) = ws_stream.split();
    shared.listeners.emit(TransportEvent::Open);

    let mut close_event = CloseEvent::abnormal();
    let mut close_sent = false;

    loop {
        tokio::select! {
            // Incoming frames from the peer
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let frame = Frame::Text(text.as_str().to_owned());
                        shared.listeners.emit(TransportEvent::Message(frame));
                    }

                    Some(Ok(Message::Binary(bytes))) => {
                        let frame = if shared.prefer_binary.load(Ordering::Relaxed) {
                            Frame::Binary(bytes.to_vec())
                        } else {
                            Frame::text_lossy(&bytes)
                        };
                        shared.listeners.emit(TransportEvent::Message(frame));
                    }

                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "WebSocket closed by remote");
                        close_event = close_event_from(frame);
                        // Push out the close reply tungstenite queued
                        let _ = ws_write.flush().await;
                        break;
                    }

                    Some(Ok(_)) => {
                        trace!("Ignoring control frame");
                    }

                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }

            // Commands from transport handles
            command = command_rx.recv() => {
                match command {
                    Some(TransportCommand::Send { frame, result_tx }) => {
                        let result = if close_sent {
                            Err(Error::ConnectionClosed)
                        } else {
                            write_frame(&mut ws_write, frame).await
                        };
                        let _ = result_tx.send(result);
                    }

                    Some(TransportCommand::Close { result_tx }) => {
                        debug!("Close requested");
                        close_sent = true;
                        let result = ws_write
                            .close()
                            .await
                            .map_err(|e| Error::close(e.to_string()));
                        let _ = result_tx.send(result);
                    }

                    None => {
                        debug!("All transport handles dropped");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    finish(&shared, command_rx, close_event);
}

/// Performs the handshake while answering commands that arrive meanwhile.
///
/// Returns `None` if the handshake failed or was aborted.
async fn connect(
    url: &Url,
    command_rx: &mut mpsc::UnboundedReceiver<TransportCommand>,
) -> Option<WsStream> {
    let handshake = connect_async(url.as_str());
    tokio::pin!(handshake);

    loop {
        tokio::select! {
            result = &mut handshake => {
                return match result {
                    Ok((stream, response)) => {
                        info!(%url, status = %response.status(), "WebSocket connection established");
                        Some(stream)
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "WebSocket connect failed");
                        None
                    }
                };
            }

            command = command_rx.recv() => {
                match command {
                    Some(TransportCommand::Send { result_tx, .. }) => {
                        let _ = result_tx.send(Err(Error::connection("transport is not open yet")));
                    }

                    Some(TransportCommand::Close { result_tx }) => {
                        debug!(%url, "Close requested during handshake");
                        let _ = result_tx.send(Ok(()));
                        return None;
                    }

                    None => {
                        debug!(%url, "All transport handles dropped during handshake");
                        return None;
                    }
                }
            }
        }
    }
}

/// Writes one frame to the socket.
async fn write_frame(ws_write: &mut WsSink, frame: Frame) -> Result<()> {
    let message = match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes.into()),
    };

    ws_write.send(message).await.map_err(|e| match e {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::SendAfterClosing) => {
            debug!(error = %e, "Write after close");
            Error::ConnectionClosed
        }
        e => {
            warn!(error = %e, "Failed to write frame");
            Error::from(e)
        }
    })?;

    trace!("Frame written");
    Ok(())
}

/// Converts a received close frame into a close event.
fn close_event_from(frame: Option<CloseFrame>) -> CloseEvent {
    match frame {
        Some(CloseFrame { code, reason }) => CloseEvent::new(u16::from(code), reason.as_str()),
        None => CloseEvent::default(),
    }
}

/// Marks the transport closed, emits `close`, then fails queued commands.
///
/// `close` goes out first so that anyone woken by a failed command already
/// sees the transport as closed.
fn finish(
    shared: &Shared,
    mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    event: CloseEvent,
) {
    shared.closing.store(true, Ordering::SeqCst);

    debug!(code = ?event.code, "WebSocket transport closed");
    shared.listeners.emit(TransportEvent::Close(event));

    command_rx.close();
    let mut failed = 0usize;
    while let Ok(command) = command_rx.try_recv() {
        match command {
            TransportCommand::Send { result_tx, .. } => {
                let _ = result_tx.send(Err(Error::ConnectionClosed));
            }
            TransportCommand::Close { result_tx } => {
                let _ = result_tx.send(Err(Error::close("transport closed")));
            }
        }
        failed += 1;
    }

    if failed > 0 {
        debug!(count = failed, "Failed pending commands on shutdown");
    }
}

// ============================================================================
// Tests
// ============================================================================
