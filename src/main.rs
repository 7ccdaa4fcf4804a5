//! voxline binary: wires the session core to the host UI and the backend.
//!
//! One `tokio::select!` loop processes UI commands, inbound backend
//! messages, and local recognizer events strictly in arrival order.

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voxline::channel;
use voxline::config;
use voxline::session::Session;
use voxline::settings::SharedState;
use voxline::speech::system::{ProcessRecognizer, SystemSynthesizer};
use voxline::ui::bridge::{emit_event, spawn_stdin_reader};
use voxline::ui::{UiCommand, UiEvent};

#[tokio::main]
async fn main() {
    // Logging goes to stderr; stdout is reserved for the UI protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    emit_event(&UiEvent::Starting {});

    let config = config::load();
    info!(backend_url = %config.backend_url, "Configuration loaded");
    let state = SharedState::new(config.settings);

    let mut cmd_rx = spawn_stdin_reader();

    // Backend channel. A failed connect leaves the session serving local
    // paths only; sends fail with a status message, matching the transport
    // error handling for a channel that dies later.
    let (outbound, mut inbound, mut channel_open) =
        match channel::connect(&config.backend_url).await {
            Ok((tx, rx)) => (tx, rx, true),
            Err(e) => {
                warn!("Backend not available: {e}");
                emit_event(&UiEvent::Status {
                    text: "Backend not available".to_string(),
                });
                let (tx, _) = mpsc::unbounded_channel();
                let (_, rx) = mpsc::unbounded_channel();
                (tx, rx, false)
            }
        };

    let (rec_tx, mut rec_rx) = mpsc::unbounded_channel();
    let recognizer = ProcessRecognizer::new(config.recognizer_command.clone(), rec_tx);
    let synthesizer = SystemSynthesizer::new();

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            emit_event(&event);
        }
    });

    let mut session = Session::new(
        state,
        outbound,
        Box::new(recognizer),
        Box::new(synthesizer),
        ui_tx,
    );

    emit_event(&UiEvent::Ready {});
    emit_event(&UiEvent::Status {
        text: "Ready".to_string(),
    });
    info!("Session core ready");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(command) => {
                        if !handle_ui_command(&mut session, command) {
                            break;
                        }
                    }
                    None => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                }
            }
            msg = inbound.recv(), if channel_open => {
                match msg {
                    Some(message) => session.handle_server_message(message),
                    None => {
                        channel_open = false;
                        session.handle_transport_closed();
                    }
                }
            }
            event = rec_rx.recv() => {
                if let Some(event) = event {
                    session.handle_recognizer_event(event);
                }
            }
        }
    }

    info!("Session core shutting down");
}

/// Dispatch a single UI command. Returns `false` when the loop should exit.
fn handle_ui_command(session: &mut Session, command: UiCommand) -> bool {
    match command {
        UiCommand::StartListening {} => session.start_listening(),
        UiCommand::StopListening {} => session.stop_listening(),
        UiCommand::UpdateSettings { settings } => session.update_settings(settings),
        UiCommand::ToggleCloud {} => session.toggle_cloud_provider(),
        UiCommand::TestVoice {} => session.test_voice(),
        UiCommand::ClearHistory {} => session.clear_history(),
        UiCommand::UpdateCredentials { key, region } => session.update_credentials(key, region),
        UiCommand::Ping {} => emit_event(&UiEvent::Pong {}),
        UiCommand::Stop {} => {
            emit_event(&UiEvent::Stopping {});
            return false;
        }
    }
    true
}
