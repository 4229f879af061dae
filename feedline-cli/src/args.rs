//! Command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use feedline_types::{ConnectionParams, SessionConfig};

/// Subscribe to a market-data gateway and store end-of-day quotes.
#[derive(Parser, Debug, Clone)]
#[command(name = "feedline", version, about)]
pub struct Args {
    /// Gateway host.
    #[arg(long, env = "FEEDLINE_HOST")]
    pub host: String,

    /// Gateway port.
    #[arg(long, env = "FEEDLINE_PORT")]
    pub port: u16,

    /// Client id presented to the gateway.
    #[arg(long = "clientId", env = "FEEDLINE_CLIENT_ID")]
    pub client_id: i32,

    /// Request market-data snapshots (yes/no, true/false, 1/0, on/off).
    #[arg(long, env = "FEEDLINE_REAL", required = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub real: bool,

    /// Request historical bars (yes/no, true/false, 1/0, on/off).
    #[arg(long, env = "FEEDLINE_HIST", required = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub hist: bool,

    /// JSON array of security records.
    #[arg(long, env = "FEEDLINE_SECURITIES", default_value = "securities.json")]
    pub securities: PathBuf,

    /// Quote file (one JSON record per line).
    #[arg(long, env = "FEEDLINE_QUOTES", default_value = "quotes.jsonl")]
    pub quotes: PathBuf,

    /// Directory for daily rolling JSON logs; console only when absent.
    #[arg(long, env = "FEEDLINE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Seconds without inbound traffic before the gateway is probed.
    #[arg(long, env = "FEEDLINE_LIVENESS_SECS", default_value_t = 30)]
    pub liveness_secs: u64,
}

impl Args {
    /// Where to connect.
    #[must_use]
    pub fn connection(&self) -> ConnectionParams {
        ConnectionParams::new(self.host.clone(), self.port, self.client_id)
    }

    /// Session configuration derived from the flags.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            realtime: self.real,
            historical: self.hist,
            liveness_threshold: Duration::from_secs(self.liveness_secs),
            ..SessionConfig::default()
        }
    }
}
