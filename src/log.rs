//! Event log: append-only, newest first.
//!
//! Purely observational. Nothing in the engine reads it back.

use chrono::NaiveTime;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Source of wall-clock stamps for log entries
pub type WallClock = fn() -> NaiveTime;

/// The local time of day
pub fn local_time() -> NaiveTime {
    chrono::Local::now().time()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub at: NaiveTime,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — {}", self.at.format("%H:%M:%S"), self.text)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: NaiveTime, text: impl Into<String>) {
        self.entries.push_front(LogEntry { at, text: text.into() });
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Entry texts without timestamps, newest first
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries rendered as `HH:MM:SS — text`, newest first
    pub fn rendered(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = EventLog::new();
        let t = NaiveTime::from_hms_opt(14, 3, 9).unwrap();
        log.push(t, "first");
        log.push(t, "second");

        assert_eq!(log.texts().collect::<Vec<_>>(), vec!["second", "first"]);
        assert_eq!(log.latest().map(|e| e.text.as_str()), Some("second"));
        assert_eq!(log.rendered()[1], "14:03:09 — first");
    }
}
