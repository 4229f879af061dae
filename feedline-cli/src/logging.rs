//! Process-wide tracing setup and the business log sink built on it.

use std::path::Path;

use feedline_core::{LogLevel, LogSink};
use rand::Rng;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// File name prefix of the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "feedline.log";

/// Install the global subscriber: console output plus, when `log_dir` is
/// given, a daily rolling JSON file.
///
/// `RUST_LOG` overrides the default `info` filter. Keep the returned guard
/// alive until exit or buffered file records are lost.
///
/// # Errors
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let console_layer = fmt::layer().with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let (writer, guard) = non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
            let layer = fmt::layer().with_ansi(false).with_writer(writer).json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}

/// Stream id of the form `YYYY/MM/DD/` followed by 32 random hex digits.
#[must_use]
pub fn stream_id() -> String {
    let day = chrono::Local::now().format("%Y/%m/%d/");
    let suffix: u128 = rand::rng().random();
    format!("{day}{suffix:032x}")
}

/// [`LogSink`] that forwards business records to `tracing`, tagged with the
/// stream id of this process.
#[derive(Debug, Clone)]
pub struct TracingLog {
    stream: String,
}

impl TracingLog {
    /// Sink with a fresh stream id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stream(stream_id())
    }

    /// Sink with a caller-chosen stream id.
    pub fn with_stream(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
        }
    }

    /// Stream id attached to every record.
    #[must_use]
    pub fn stream(&self) -> &str {
        &self.stream
    }
}

impl Default for TracingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for TracingLog {
    fn log(&self, level: LogLevel, msg: &str) {
        let stream = self.stream.as_str();
        match level {
            LogLevel::Debug => tracing::debug!(stream, "{msg}"),
            LogLevel::Info => tracing::info!(stream, "{msg}"),
            LogLevel::Warning => tracing::warn!(stream, "{msg}"),
            LogLevel::Error => tracing::error!(stream, "{msg}"),
        }
    }
}
