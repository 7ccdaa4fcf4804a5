//! On-disk configuration: backend URL, local recognizer command, and the
//! settings applied at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::settings::VoiceSettings;

/// config.json shape (written by the host UI's settings panel).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoreConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Command line whose stdout provides local transcripts. Unset means
    /// the local recognition path reports a configuration error.
    #[serde(default)]
    pub recognizer_command: Option<String>,
    #[serde(default)]
    pub settings: VoiceSettings,
}

fn default_backend_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            recognizer_command: None,
            settings: VoiceSettings::default(),
        }
    }
}

/// Read config.json from the data directory, falling back to defaults when
/// the file is missing or malformed.
pub fn load() -> CoreConfig {
    load_from(&config_path())
}

/// Read a config file from an explicit path.
pub fn load_from(path: &Path) -> CoreConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                CoreConfig::default()
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {e}", path.display());
            }
            CoreConfig::default()
        }
    }
}

/// Path to config.json in the per-user data directory.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxline")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::VoiceId;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.json"));
        assert_eq!(config.backend_url, "ws://localhost:8000/ws");
        assert!(config.recognizer_command.is_none());
        assert!(!config.settings.use_cloud);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"backend_url":"ws://10.0.0.2:9000/ws","settings":{"voice":"british"}}"#,
        )
        .unwrap();
        let config = load_from(&path);
        assert_eq!(config.backend_url, "ws://10.0.0.2:9000/ws");
        assert_eq!(config.settings.voice, VoiceId::British);
        assert_eq!(config.settings.speed, 1.0);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = load_from(&path);
        assert_eq!(config.backend_url, "ws://localhost:8000/ws");
    }
}
