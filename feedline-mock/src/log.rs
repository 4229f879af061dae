use std::sync::{Mutex, PoisonError};

use feedline_core::{LogLevel, LogSink};

/// Log sink that keeps every record for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLog {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLog {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record so far.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages logged at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Whether some record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }

    /// Number of records at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.messages(level).len()
    }
}

impl LogSink for RecordingLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
