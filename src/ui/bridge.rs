//! UI bridge: stdin command reader and stdout event emitter.
//!
//! A blocking stdin reader thread forwards deserialized commands through an
//! mpsc channel; events go out as JSON lines on stdout. Logging stays on
//! stderr so stdout carries nothing but the protocol.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::{UiCommand, UiEvent};

/// Emit a `UiEvent` as a JSON line on stdout and flush.
pub fn emit_event(event: &UiEvent) {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            error!("Failed to serialize UI event: {e}");
            return;
        }
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Ignore write/flush errors — pipe may be closed.
    let _ = writeln!(handle, "{json}");
    let _ = handle.flush();
}

/// Spawn a blocking thread that reads JSON lines from stdin, deserializes
/// them into `UiCommand`, and forwards them through the returned channel.
///
/// The thread exits when stdin is closed (host process gone) or on
/// unrecoverable read error.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<UiCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        let reader = stdin.lock();
        for line in reader.lines() {
            match line {
                Ok(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<UiCommand>(trimmed) {
                        Ok(cmd) => {
                            debug!(?cmd, "Received UI command");
                            if tx.send(cmd).is_err() {
                                break; // Receiver dropped — main loop is gone.
                            }
                        }
                        Err(e) => {
                            error!("Invalid UI command: {e} — input: {trimmed}");
                            emit_event(&UiEvent::Status {
                                text: format!("Invalid command: {e}"),
                            });
                        }
                    }
                }
                Err(e) => {
                    error!("stdin read error: {e}");
                    break; // stdin closed
                }
            }
        }
        debug!("stdin reader thread exiting");
    });

    rx
}
