//! Echo client: queue a few frames, print what comes back, then close.
//!
//! Usage: `cargo run --example echo_client -- [ws://host:port/path] [--debug]`

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use socrates::{Options, Socket};
use tokio::sync::mpsc;
use tokio::time::timeout;

use common::{Args, init_logging};

// ============================================================================
// Constants
// ============================================================================

const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();

    println!("[Connect] {}", args.address);
    let socket = Socket::open(
        &args.address,
        Options::new()
            .with_on_message(move |bytes| {
                let _ = reply_tx.send(bytes);
            })
            .with_on_close(|reason| {
                println!("[Close] reason={:?}", String::from_utf8_lossy(&reason));
            })
            .with_on_error(|e| eprintln!("[Error] {e}")),
    )?;

    // Both are held until the handshake completes
    socket.send("Hello from socrates!");
    socket.send_binary(b"raw bytes".to_vec());

    loop {
        match timeout(REPLY_TIMEOUT, reply_rx.recv()).await {
            Ok(Some(bytes)) => {
                println!("[Recv] {}", String::from_utf8_lossy(&bytes));
            }
            Ok(None) => break,
            Err(_) => {
                println!("[Done] no reply within {}s", REPLY_TIMEOUT.as_secs());
                break;
            }
        }
    }

    println!("[State] {}", socket.state());
    socket.close().await?;

    // Give the close handshake a moment to finish
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}
