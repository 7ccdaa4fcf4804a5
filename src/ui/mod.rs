//! Protocol types for the host UI process.
//!
//! Commands use `{"command": "<name>", ...}` format (UI -> core, stdin).
//! Events use `{"event": "<name>", "data": {...}}` format (core -> UI,
//! stdout).

pub mod bridge;

use serde::{Deserialize, Serialize};

use crate::channel::CloudRegion;
use crate::history::HistoryEntry;
use crate::settings::VoiceSettings;

/// User intents received from the host UI as JSON lines on stdin.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum UiCommand {
    StartListening {},
    StopListening {},
    UpdateSettings { settings: VoiceSettings },
    ToggleCloud {},
    TestVoice {},
    ClearHistory {},
    UpdateCredentials { key: String, region: CloudRegion },
    Ping {},
    Stop {},
}

/// Display-state updates emitted to the host UI as JSON lines on stdout.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum UiEvent {
    Starting {},
    Ready {},
    /// One-line status indicator ("Ready", "Processing...", errors, ...).
    Status { text: String },
    /// Current transcript, cleared when listening starts.
    Transcript { text: String },
    /// Current response text, cleared when listening starts.
    Response { text: String },
    /// Whether a listening phase is active.
    Listening { active: bool },
    /// Full history snapshot, newest first.
    History { entries: Vec<HistoryEntry> },
    /// Current settings, emitted after every mutation.
    Settings { settings: VoiceSettings },
    /// Cloud-availability flag changed.
    CloudAvailable { available: bool },
    Pong {},
    Stopping {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_tagged_json() {
        let cmd: UiCommand = serde_json::from_str(r#"{"command":"start_listening"}"#).unwrap();
        assert!(matches!(cmd, UiCommand::StartListening {}));

        let cmd: UiCommand = serde_json::from_str(
            r#"{"command":"update_settings","settings":{"voice":"british","speed":1.5,"volume":0.8,"use_cloud":true}}"#,
        )
        .unwrap();
        match cmd {
            UiCommand::UpdateSettings { settings } => {
                assert!(settings.use_cloud);
                assert_eq!(settings.speed, 1.5);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cmd: UiCommand = serde_json::from_str(
            r#"{"command":"update_credentials","key":"k","region":"eastus"}"#,
        )
        .unwrap();
        assert!(matches!(cmd, UiCommand::UpdateCredentials { .. }));
    }

    #[test]
    fn events_serialize_with_event_and_data() {
        let json = serde_json::to_value(UiEvent::Status {
            text: "Ready".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "status");
        assert_eq!(json["data"]["text"], "Ready");
    }
}
