//! voxline — client-side session core for a voice assistant.
//!
//! Turns raw asynchronous signals (local transcripts, backend responses,
//! cloud speech events) into a coherent conversational session, and turns
//! user intent into correctly-sequenced outbound actions. The host UI
//! talks JSON lines on stdin/stdout; the backend is reached over one
//! persistent WebSocket.

pub mod channel;
pub mod config;
pub mod history;
pub mod session;
pub mod settings;
pub mod speech;
pub mod ui;

pub use channel::{ClientMessage, CloudRegion, ServerMessage};
pub use history::{CommandKind, HistoryEntry, HistoryLog, ResponseSource};
pub use session::{Session, SessionPhase};
pub use settings::{SharedState, VoiceId, VoiceSettings};
