//! Remote channel: one persistent duplex WebSocket to the backend.
//!
//! Opened once at startup. A writer task serializes outbound
//! [`ClientMessage`]s to JSON text frames; a reader task parses inbound
//! frames into [`ServerMessage`]s. There is no reconnect logic — when the
//! socket closes, the inbound receiver ends and the session surfaces a
//! status message.

pub mod protocol;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

pub use protocol::{ClientMessage, CloudRegion, CommandResponse, ServerMessage};

/// Connect to the backend and spawn the reader/writer tasks.
///
/// Returns the outbound sender and the inbound receiver. Dropping the sender
/// closes the socket; the receiver yields `None` once the socket is gone.
pub async fn connect(
    url: &str,
) -> anyhow::Result<(
    mpsc::UnboundedSender<ClientMessage>,
    mpsc::UnboundedReceiver<ServerMessage>,
)> {
    let (ws_stream, _) = connect_async(url).await?;
    debug!(url, "Backend channel open");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer: outbound queue -> text frames.
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize outbound message: {e}");
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::Text(json)).await {
                error!("Backend send failed: {e}");
                break;
            }
        }
        debug!("Channel writer task exiting");
    });

    // Reader: text frames -> inbound queue.
    tokio::spawn(async move {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => {
                        if in_tx.send(msg).is_err() {
                            break; // Receiver dropped — session loop is gone.
                        }
                    }
                    Err(e) => warn!("Unrecognized backend message: {e} — input: {text}"),
                },
                Ok(Message::Close(_)) => {
                    debug!("Backend closed the channel");
                    break;
                }
                Ok(_) => {} // ping/pong/binary frames are not part of the protocol
                Err(e) => {
                    error!("Backend read failed: {e}");
                    break;
                }
            }
        }
        debug!("Channel reader task exiting");
    });

    Ok((out_tx, in_rx))
}
