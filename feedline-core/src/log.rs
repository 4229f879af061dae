use core::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a business log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that the client recovered from.
    Warning,
    /// A failure that lost data or ended a session.
    Error,
}

impl LogLevel {
    /// Upper-case level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for the client's business log records.
///
/// The sink owns any stream identity and sequencing; callers only supply a
/// level and a message. Logging never fails from the caller's point of view.
pub trait LogSink: Send + Sync {
    /// Record one message.
    fn log(&self, level: LogLevel, message: &str);

    /// Record at debug level.
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Record at info level.
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Record at warning level.
    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    /// Record at error level.
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl LogSink for NullLog {
    fn log(&self, _level: LogLevel, _message: &str) {}
}
