//! Session state machine: routes user intent and inbound events to side
//! effects (speak, log, display).
//!
//! All handlers run on the single event loop, so no locking is needed
//! beyond the [`SharedState`] cell. The inbound-message handler lives for
//! the whole connection; it must read settings and cloud availability
//! through `SharedState` at dispatch time, never from values captured when
//! the session was built.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::{ClientMessage, CloudRegion, ServerMessage};
use crate::history::{CommandKind, HistoryEntry, HistoryLog, ResponseSource};
use crate::settings::{SharedState, VoiceSettings};
use crate::speech::{Recognizer, RecognizerEvent, SpeechRequest, Synthesizer};
use crate::ui::UiEvent;

/// Phrase spoken by the voice test.
const TEST_PHRASE: &str = "This is a test of your voice settings. How does it sound?";

/// Conversation phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    /// Local recognition in progress.
    ListeningLocal,
    /// Cloud recognition requested; the result arrives on the channel.
    ListeningCloud,
    /// A command was submitted; waiting for the interpreter result.
    Processing,
    /// The backend channel is gone. Local paths still work.
    Error,
}

/// The orchestrator. Owns phase, display state, the history log, and the
/// seams to the local adapters and the backend channel.
pub struct Session {
    state: Arc<SharedState>,
    phase: SessionPhase,
    transcript: String,
    response: String,
    history: HistoryLog,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    recognizer: Box<dyn Recognizer>,
    synthesizer: Box<dyn Synthesizer>,
    /// Text of the in-flight cloud synthesis request, kept for the one-time
    /// local fallback on a synthesis error.
    pending_synthesis: Option<String>,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl Session {
    pub fn new(
        state: Arc<SharedState>,
        outbound: mpsc::UnboundedSender<ClientMessage>,
        recognizer: Box<dyn Recognizer>,
        synthesizer: Box<dyn Synthesizer>,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            state,
            phase: SessionPhase::Idle,
            transcript: String::new(),
            response: String::new(),
            history: HistoryLog::new(),
            outbound,
            recognizer,
            synthesizer,
            pending_synthesis: None,
            events,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    // -----------------------------------------------------------------
    // User intent
    // -----------------------------------------------------------------

    /// Start a recognition pass on the cloud or local path, per the
    /// current settings snapshot.
    pub fn start_listening(&mut self) {
        self.transcript.clear();
        self.response.clear();
        self.emit(UiEvent::Transcript { text: String::new() });
        self.emit(UiEvent::Response { text: String::new() });

        let snap = self.state.snapshot();
        if snap.use_cloud && self.state.cloud_available() {
            if self.outbound.send(ClientMessage::AzureRecognize {}).is_ok() {
                self.set_phase(SessionPhase::ListeningCloud);
                self.set_status("Listening (cloud)...");
                return;
            }
            warn!("Backend channel closed, falling back to local recognition");
        }
        self.start_local_listening();
    }

    /// Cancel local recognition and force the phase back to idle. An
    /// outstanding cloud request cannot be cancelled; its late result is
    /// still processed if it arrives.
    pub fn stop_listening(&mut self) {
        self.recognizer.stop();
        self.set_phase(SessionPhase::Idle);
        self.set_status("Ready");
    }

    /// Replace the settings value. Takes effect for every subsequent
    /// dispatch, including responses to requests already in flight.
    pub fn update_settings(&mut self, new: VoiceSettings) {
        self.state.update(new);
        self.emit(UiEvent::Settings {
            settings: self.state.snapshot(),
        });
    }

    /// Flip the cloud-provider preference.
    pub fn toggle_cloud_provider(&mut self) {
        let settings = self.state.toggle_cloud();
        info!(use_cloud = settings.use_cloud, "Cloud provider toggled");
        self.emit(UiEvent::Settings { settings });
    }

    /// Speak a fixed sample phrase through the normal dispatcher.
    pub fn test_voice(&mut self) {
        self.speak(TEST_PHRASE);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.emit_history();
    }

    /// Forward new cloud credentials to the backend. Nothing is persisted
    /// locally; availability changes only when the backend answers.
    pub fn update_credentials(&mut self, key: String, region: CloudRegion) {
        let sent = self
            .outbound
            .send(ClientMessage::UpdateAzureCredentials { key, region })
            .is_ok();
        if sent {
            self.set_status("Updating cloud credentials...");
        } else {
            self.set_status("Backend not connected");
        }
    }

    // -----------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------

    /// Handle one event from the local recognizer.
    pub fn handle_recognizer_event(&mut self, event: RecognizerEvent) {
        match event {
            RecognizerEvent::Interim { transcript } => {
                self.transcript = transcript;
                self.emit(UiEvent::Transcript {
                    text: self.transcript.clone(),
                });
            }
            RecognizerEvent::Final { transcript } => {
                self.transcript = transcript.clone();
                self.emit(UiEvent::Transcript {
                    text: self.transcript.clone(),
                });
                self.submit_command(transcript);
            }
            RecognizerEvent::Error { message } => {
                warn!(%message, "Local recognition error");
                self.set_status(&format!("Error: {message}"));
                if self.phase == SessionPhase::ListeningLocal {
                    self.set_phase(SessionPhase::Idle);
                }
            }
            RecognizerEvent::Ended => {
                if self.phase == SessionPhase::ListeningLocal {
                    self.set_phase(SessionPhase::Idle);
                    self.set_status("Ready");
                }
            }
        }
    }

    /// Handle one inbound message from the backend channel.
    pub fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Response {
                text,
                success,
                command_type,
            } => {
                let command = self.transcript.clone();
                self.complete_command(command, text, success, &command_type, ResponseSource::Local);
            }

            ServerMessage::AzureRecognitionResult {
                transcript,
                response,
                success,
            } => {
                if success {
                    self.transcript = transcript.clone();
                    self.emit(UiEvent::Transcript {
                        text: self.transcript.clone(),
                    });
                    self.complete_command(
                        transcript,
                        response.text,
                        response.success,
                        &response.command_type,
                        ResponseSource::Cloud,
                    );
                } else {
                    self.set_status("Speech not recognized");
                    self.set_phase(SessionPhase::Idle);
                }
            }

            ServerMessage::AzureRecognitionError { error } => {
                warn!(%error, "Cloud recognition error, switching to local");
                self.state.set_cloud_available(false);
                self.emit(UiEvent::CloudAvailable { available: false });
                self.set_status("Cloud recognition unavailable, using device recognition");
                self.start_local_listening();
            }

            ServerMessage::AzureSynthesisComplete { .. } => {
                debug!("Cloud synthesis complete");
                self.pending_synthesis = None;
            }

            ServerMessage::AzureSynthesisError { error, text } => {
                warn!(%error, "Cloud synthesis error, falling back to local voice");
                // One-time fallback with the same text; availability and the
                // history log are untouched.
                let fallback = text.or_else(|| self.pending_synthesis.take());
                self.pending_synthesis = None;
                if let Some(text) = fallback {
                    self.speak_local(&text);
                }
            }

            ServerMessage::TimerComplete { text, .. } => {
                self.response = text.clone();
                self.emit(UiEvent::Response { text: text.clone() });
                self.set_status("Timer finished!");
                self.history.append(HistoryEntry::new(
                    "Timer notification",
                    text.clone(),
                    CommandKind::TimerComplete,
                    true,
                    ResponseSource::System,
                ));
                self.emit_history();
                self.speak(&text);
            }

            ServerMessage::AzureCredentialsUpdated { success, message } => {
                if success {
                    self.state.set_cloud_available(true);
                    self.emit(UiEvent::CloudAvailable { available: true });
                }
                let status = if message.is_empty() {
                    "Cloud credentials updated".to_string()
                } else {
                    message
                };
                self.set_status(&status);
            }

            ServerMessage::AzureCredentialsError { error, .. } => {
                warn!(%error, "Credential update rejected");
                self.set_status(&format!("Credential update failed: {error}"));
            }
        }
    }

    /// The backend channel is gone. Surfaced as status only; local
    /// recognition and synthesis keep working.
    pub fn handle_transport_closed(&mut self) {
        warn!("Backend channel closed");
        self.set_phase(SessionPhase::Error);
        self.set_status("Backend disconnected");
    }

    // -----------------------------------------------------------------
    // Synthesis dispatcher
    // -----------------------------------------------------------------

    /// Speak text on the cloud or local path, per the settings snapshot
    /// read now — not the one current when the triggering request started.
    pub fn speak(&mut self, text: &str) {
        let snap = self.state.snapshot();
        if snap.use_cloud && self.state.cloud_available() {
            self.pending_synthesis = Some(text.to_string());
            let sent = self
                .outbound
                .send(ClientMessage::AzureSynthesize {
                    text: text.to_string(),
                    voice_name: snap.voice.cloud_voice_name().to_string(),
                })
                .is_ok();
            if sent {
                return;
            }
            self.pending_synthesis = None;
            warn!("Backend channel closed, falling back to local synthesis");
        }
        self.speak_local(text);
    }

    fn speak_local(&mut self, text: &str) {
        let snap = self.state.snapshot();
        let request = SpeechRequest {
            text: text.to_string(),
            rate: snap.speed,
            volume: snap.volume,
            voice: snap.voice,
        };
        if let Err(e) = self.synthesizer.speak(request) {
            warn!("Local synthesis failed: {e}");
            self.set_status(&format!("Speech output failed: {e}"));
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn start_local_listening(&mut self) {
        match self.recognizer.start() {
            Ok(()) => {
                self.set_phase(SessionPhase::ListeningLocal);
                self.set_status("Listening...");
            }
            Err(e) => {
                warn!("Local recognition failed to start: {e}");
                self.set_phase(SessionPhase::Idle);
                self.set_status(&format!("Error: {e}"));
            }
        }
    }

    fn submit_command(&mut self, command: String) {
        self.set_phase(SessionPhase::Processing);
        self.set_status("Processing...");
        if self
            .outbound
            .send(ClientMessage::ProcessCommand { command })
            .is_err()
        {
            self.response = "Unable to reach the assistant service".to_string();
            self.emit(UiEvent::Response {
                text: self.response.clone(),
            });
            self.set_phase(SessionPhase::Error);
            self.set_status("Backend not connected");
        }
    }

    /// Common tail for command-processed responses on either path: display,
    /// log, and dispatch synthesis with the current settings snapshot.
    fn complete_command(
        &mut self,
        command: String,
        text: String,
        success: bool,
        command_type: &str,
        source: ResponseSource,
    ) {
        self.response = text.clone();
        self.emit(UiEvent::Response { text: text.clone() });
        self.set_phase(SessionPhase::Idle);
        self.set_status(if success { "Success" } else { "Command not recognized" });

        self.history.append(HistoryEntry::new(
            command,
            text.clone(),
            CommandKind::from(command_type),
            success,
            source,
        ));
        self.emit_history();

        self.speak(&text);
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase == phase {
            return;
        }
        debug!(from = ?self.phase, to = ?phase, "Phase transition");
        self.phase = phase;
        self.emit(UiEvent::Listening {
            active: matches!(
                phase,
                SessionPhase::ListeningLocal | SessionPhase::ListeningCloud
            ),
        });
    }

    fn set_status(&mut self, text: &str) {
        self.emit(UiEvent::Status {
            text: text.to_string(),
        });
    }

    fn emit_history(&self) {
        self.emit(UiEvent::History {
            entries: self.history.to_vec(),
        });
    }

    fn emit(&self, event: UiEvent) {
        // UI gone is not an error for the session.
        let _ = self.events.send(event);
    }
}
