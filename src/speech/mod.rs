//! Local speech adapters: recognition and synthesis seams plus voice
//! resolution against the platform voice list.
//!
//! The platform engines are external capability providers. Recognition
//! emits interim and final transcript events plus an error/end event;
//! synthesis accepts text + rate + volume + voice and speaks to completion
//! with no required completion callback.

pub mod system;

use tokio::sync::mpsc;

use crate::settings::VoiceId;

/// Events emitted by a local recognizer. Delivered through the mpsc sender
/// handed to the adapter at construction — the adapter is installed once,
/// so all per-utterance state flows through these events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Partial transcript while the user is still speaking.
    Interim { transcript: String },
    /// Final transcript; the session submits this as a command.
    Final { transcript: String },
    /// Platform-reported failure (no microphone permission, no engine, ...).
    Error { message: String },
    /// The engine stopped listening without producing a final transcript.
    Ended,
}

/// Sender half used by recognizer implementations.
pub type RecognizerEventSender = mpsc::UnboundedSender<RecognizerEvent>;

/// Local speech-to-text adapter.
pub trait Recognizer: Send {
    /// Begin one recognition pass. Events arrive asynchronously.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Cancel an in-flight recognition pass, if any.
    fn stop(&mut self);
}

/// One synthesis invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// Rate multiplier, 0.5..=2.0.
    pub rate: f32,
    /// Volume, 0..=1.
    pub volume: f32,
    pub voice: VoiceId,
}

/// Local text-to-speech adapter. Fire-and-forget: implementations start
/// speaking and return; there is no completion callback.
pub trait Synthesizer: Send {
    fn speak(&mut self, request: SpeechRequest) -> anyhow::Result<()>;
}

/// A voice offered by the platform synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVoice {
    pub name: String,
    /// BCP-47 language tag, e.g. `en-GB`.
    pub language: String,
}

impl LocalVoice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// Best-effort match of a [`VoiceId`] against the platform voice list.
///
/// `British`/`Australian` take the first voice with the matching language
/// tag; `Female` takes the first voice whose name contains "female";
/// `Default` (and any miss) falls back to the platform default, signalled
/// by `None`.
pub fn resolve_voice(voices: &[LocalVoice], id: VoiceId) -> Option<&LocalVoice> {
    match id {
        VoiceId::Default => None,
        VoiceId::British => voices.iter().find(|v| v.language.starts_with("en-GB")),
        VoiceId::Australian => voices.iter().find(|v| v.language.starts_with("en-AU")),
        VoiceId::Female => voices
            .iter()
            .find(|v| v.name.to_lowercase().contains("female")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<LocalVoice> {
        vec![
            LocalVoice::new("English (America)", "en-US"),
            LocalVoice::new("English (Great Britain)", "en-GB"),
            LocalVoice::new("English (Australia)", "en-AU"),
            LocalVoice::new("English female", "en-US"),
        ]
    }

    #[test]
    fn british_matches_language_tag() {
        let voices = voices();
        let v = resolve_voice(&voices, VoiceId::British).unwrap();
        assert_eq!(v.language, "en-GB");
    }

    #[test]
    fn female_matches_name_substring() {
        let voices = voices();
        let v = resolve_voice(&voices, VoiceId::Female).unwrap();
        assert_eq!(v.name, "English female");
    }

    #[test]
    fn default_and_misses_use_platform_default() {
        let voices = voices();
        assert!(resolve_voice(&voices, VoiceId::Default).is_none());
        let no_au = vec![LocalVoice::new("English (America)", "en-US")];
        assert!(resolve_voice(&no_au, VoiceId::Australian).is_none());
    }
}
