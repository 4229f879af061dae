//! Configuration types shared by the engine, its collaborators and the CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Largest inbound frame the gateway protocol allows (24-bit length).
pub const DEFAULT_MAX_FRAME_LEN: usize = 0x00FF_FFFF;

/// Exponential backoff configuration for retrying reads that may come back empty.
///
/// The wait before retry `n` (starting at 1) is `unit * base^n`, so the
/// defaults wait 2s, 4s, ..., 1024s over ten retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Number of retries after the initial call.
    pub max_attempts: u32,
    /// Exponential base applied per attempt (>= 1).
    pub base: u32,
    /// Length of one backoff unit.
    pub unit: Duration,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base: 2,
            unit: Duration::from_secs(1),
            jitter_percent: 0,
        }
    }
}

impl BackoffConfig {
    /// Delay before the given retry attempt (1-based), before jitter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.base.max(1).saturating_pow(attempt);
        self.unit.saturating_mul(factor)
    }
}

/// Where and as whom to connect to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Gateway host name or address.
    pub host: String,
    /// Gateway TCP port.
    pub port: u16,
    /// Client id presented to the gateway; sessions with the same id collide.
    pub client_id: i32,
}

impl ConnectionParams {
    /// Build connection parameters.
    pub fn new(host: impl Into<String>, port: u16, client_id: i32) -> Self {
        Self {
            host: host.into(),
            port,
            client_id,
        }
    }
}

/// Parameters attached to every market-data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataParams {
    /// Comma-separated generic tick list; empty for the default set.
    pub generic_ticks: String,
    /// Request a one-shot snapshot instead of a continuous stream.
    pub snapshot: bool,
    /// Request a regulatory snapshot (billed by the gateway).
    pub regulatory_snapshot: bool,
}

impl Default for MarketDataParams {
    fn default() -> Self {
        Self {
            generic_ticks: String::new(),
            snapshot: true,
            regulatory_snapshot: false,
        }
    }
}

/// Parameters attached to every historical-data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalParams {
    /// End of the requested window; empty means "now".
    pub end_date_time: String,
    /// Window length, e.g. "2 D".
    pub duration: String,
    /// Bar size, e.g. "1 day".
    pub bar_size: String,
    /// Data series, e.g. "TRADES".
    pub what_to_show: String,
    /// Restrict to regular trading hours.
    pub use_rth: bool,
    /// Date format selector understood by the gateway (1 = yyyyMMdd).
    pub format_date: u8,
    /// Keep the request open for updates after the initial window.
    pub keep_up_to_date: bool,
}

impl Default for HistoricalParams {
    fn default() -> Self {
        Self {
            end_date_time: String::new(),
            duration: "2 D".to_string(),
            bar_size: "1 day".to_string(),
            what_to_show: "TRADES".to_string(),
            use_rth: true,
            format_date: 1,
            keep_up_to_date: false,
        }
    }
}

/// Session-level configuration for the consumption loop and resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long one loop iteration waits on the inbound queue.
    pub poll_interval: Duration,
    /// Idle time after which the liveness probe and replay run.
    pub liveness_threshold: Duration,
    /// Frames longer than this are a fatal protocol violation.
    pub max_frame_len: usize,
    /// Capacity of the inbound frame queue between reader and loop.
    pub inbound_capacity: usize,
    /// Subscribe to market data for every validated instrument.
    pub realtime: bool,
    /// Pull historical bars for every validated instrument.
    pub historical: bool,
    /// Market-data request parameters.
    pub market_data: MarketDataParams,
    /// Historical request parameters.
    pub history: HistoricalParams,
    /// Backoff used when the record store comes back empty.
    pub backoff: BackoffConfig,
    /// Source tag written with every quote record.
    pub source: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            liveness_threshold: Duration::from_secs(30),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            inbound_capacity: 1024,
            realtime: false,
            historical: false,
            market_data: MarketDataParams::default(),
            history: HistoricalParams::default(),
            backoff: BackoffConfig::default(),
            source: "IB".to_string(),
        }
    }
}
