//! Bounded in-memory log of past exchanges, newest first.

use std::collections::VecDeque;

use chrono::Local;
use serde::Serialize;

/// Maximum number of entries kept in the log.
pub const HISTORY_CAPACITY: usize = 15;

/// Which path produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Local,
    Cloud,
    System,
}

/// Command categories reported by the backend interpreter.
///
/// The backend owns this vocabulary; anything it sends that we don't know
/// maps to `Unknown` rather than failing the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Help,
    Time,
    Date,
    Timer,
    TimerComplete,
    Joke,
    Math,
    Password,
    Motivation,
    Coin,
    Dice,
    Error,
    Unknown,
}

impl From<&str> for CommandKind {
    fn from(s: &str) -> Self {
        match s {
            "help" => Self::Help,
            "time" => Self::Time,
            "date" => Self::Date,
            "timer" => Self::Timer,
            "timer_complete" => Self::TimerComplete,
            "joke" => Self::Joke,
            "math" => Self::Math,
            "password" => Self::Password,
            "motivation" => Self::Motivation,
            "coin" => Self::Coin,
            "dice" => Self::Dice,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// One completed exchange. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub command: String,
    pub response: String,
    pub timestamp: String,
    #[serde(rename = "command_type")]
    pub kind: CommandKind,
    pub success: bool,
    pub source: ResponseSource,
}

impl HistoryEntry {
    pub fn new(
        command: impl Into<String>,
        response: impl Into<String>,
        kind: CommandKind,
        success: bool,
        source: ResponseSource,
    ) -> Self {
        Self {
            command: command.into(),
            response: response.into(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            kind,
            success,
            source,
        }
    }
}

/// Ordered record of past exchanges, newest first, capacity 15.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, evicting the oldest beyond capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry, if any.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entries newest-first, for display.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Owned copy of the log for emitting to the host UI.
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry::new(
            format!("command {n}"),
            format!("response {n}"),
            CommandKind::Time,
            true,
            ResponseSource::Local,
        )
    }

    #[test]
    fn append_keeps_newest_first() {
        let mut log = HistoryLog::new();
        log.append(entry(1));
        log.append(entry(2));
        assert_eq!(log.latest().unwrap().command, "command 2");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn sixteenth_entry_evicts_oldest() {
        let mut log = HistoryLog::new();
        for n in 0..16 {
            log.append(entry(n));
        }
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.latest().unwrap().command, "command 15");
        let oldest = log.entries().last().unwrap();
        assert_eq!(oldest.command, "command 1");
    }

    #[test]
    fn clear_empties_log() {
        let mut log = HistoryLog::new();
        log.append(entry(1));
        log.clear();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
    }

    #[test]
    fn unknown_command_kind_maps_to_unknown() {
        assert_eq!(CommandKind::from("time"), CommandKind::Time);
        assert_eq!(CommandKind::from("weather"), CommandKind::Unknown);
    }

    #[test]
    fn entry_serializes_wire_field_names() {
        let json = serde_json::to_value(entry(1)).unwrap();
        assert_eq!(json["command_type"], "time");
        assert_eq!(json["source"], "local");
        assert_eq!(json["success"], true);
    }
}
