//! Voice settings and the shared live snapshot read by long-lived handlers.
//!
//! The inbound-message handler is registered once for the lifetime of the
//! backend connection, but settings change underneath it. Every dispatch
//! decision therefore reads through [`SharedState`] at dispatch time instead
//! of capturing a settings value when the handler was installed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Allowed speech rate multiplier range.
pub const SPEED_MIN: f32 = 0.5;
pub const SPEED_MAX: f32 = 2.0;

/// Selectable voice identities. The cloud provider names and local
/// resolution hints are fixed; see [`VoiceId::cloud_voice_name`] and
/// `speech::resolve_voice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceId {
    #[default]
    Default,
    British,
    Australian,
    Female,
}

impl VoiceId {
    /// Provider voice name used for cloud synthesis requests.
    pub fn cloud_voice_name(self) -> &'static str {
        match self {
            Self::Default => "en-US-DavisNeural",
            Self::British => "en-GB-RyanNeural",
            Self::Australian => "en-AU-WilliamNeural",
            Self::Female => "en-GB-LibbyNeural",
        }
    }
}

/// User-facing voice settings. Mutated only through [`SharedState::update`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VoiceSettings {
    #[serde(default)]
    pub voice: VoiceId,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub use_cloud: bool,
}

fn default_speed() -> f32 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: VoiceId::Default,
            speed: 1.0,
            volume: 1.0,
            use_cloud: false,
        }
    }
}

impl VoiceSettings {
    /// Clamp speed and volume into their allowed ranges.
    pub fn clamped(mut self) -> Self {
        self.speed = self.speed.clamp(SPEED_MIN, SPEED_MAX);
        self.volume = self.volume.clamp(0.0, 1.0);
        self
    }
}

/// Process-wide mutable session state, shareable via `Arc`.
///
/// Holds the current [`VoiceSettings`] and the cloud-availability flag.
/// Writers are the user-intent handlers; the single reader that matters is
/// the inbound-message dispatch path, which must always observe the most
/// recently set values.
#[derive(Debug)]
pub struct SharedState {
    settings: RwLock<VoiceSettings>,
    cloud_available: AtomicBool,
}

impl SharedState {
    pub fn new(settings: VoiceSettings) -> Arc<Self> {
        Arc::new(Self {
            settings: RwLock::new(settings.clamped()),
            cloud_available: AtomicBool::new(true),
        })
    }

    /// Current settings value.
    pub fn snapshot(&self) -> VoiceSettings {
        *self.settings.read().expect("settings lock poisoned")
    }

    /// Replace the whole settings value. Range invariants are enforced here;
    /// no other field validation is performed.
    pub fn update(&self, new: VoiceSettings) {
        *self.settings.write().expect("settings lock poisoned") = new.clamped();
    }

    /// Flip the cloud-provider preference, returning the new settings.
    pub fn toggle_cloud(&self) -> VoiceSettings {
        let mut guard = self.settings.write().expect("settings lock poisoned");
        guard.use_cloud = !guard.use_cloud;
        *guard
    }

    pub fn cloud_available(&self) -> bool {
        self.cloud_available.load(Ordering::Acquire)
    }

    /// Set on cloud-provider errors (false) and successful credential
    /// updates (true).
    pub fn set_cloud_available(&self, available: bool) {
        self.cloud_available.store(available, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_clamps_ranges() {
        let state = SharedState::new(VoiceSettings::default());
        state.update(VoiceSettings {
            voice: VoiceId::British,
            speed: 9.0,
            volume: -1.0,
            use_cloud: true,
        });
        let snap = state.snapshot();
        assert_eq!(snap.speed, SPEED_MAX);
        assert_eq!(snap.volume, 0.0);
        assert!(snap.use_cloud);
    }

    #[test]
    fn snapshot_sees_latest_update() {
        let state = SharedState::new(VoiceSettings::default());
        let reader = Arc::clone(&state);
        state.update(VoiceSettings {
            voice: VoiceId::Australian,
            ..VoiceSettings::default()
        });
        // A handle taken before the update still observes the new value.
        assert_eq!(reader.snapshot().voice, VoiceId::Australian);
    }

    #[test]
    fn cloud_availability_round_trip() {
        let state = SharedState::new(VoiceSettings::default());
        assert!(state.cloud_available());
        state.set_cloud_available(false);
        assert!(!state.cloud_available());
        state.set_cloud_available(true);
        assert!(state.cloud_available());
    }

    #[test]
    fn voice_id_cloud_names() {
        assert_eq!(VoiceId::Default.cloud_voice_name(), "en-US-DavisNeural");
        assert_eq!(VoiceId::British.cloud_voice_name(), "en-GB-RyanNeural");
        assert_eq!(VoiceId::Australian.cloud_voice_name(), "en-AU-WilliamNeural");
        assert_eq!(VoiceId::Female.cloud_voice_name(), "en-GB-LibbyNeural");
    }

    #[test]
    fn voice_id_wire_names() {
        let json = serde_json::to_string(&VoiceId::British).unwrap();
        assert_eq!(json, "\"british\"");
        let parsed: VoiceId = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(parsed, VoiceId::Female);
    }
}
