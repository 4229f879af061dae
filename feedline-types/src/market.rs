//! Market data payloads: ticks, bars and the quote records persisted from them.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FeedlineError;

/// Tick field identifier carried by price and size ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickType(pub i32);

impl TickType {
    /// Bid size.
    pub const BID_SIZE: Self = Self(0);
    /// Bid price.
    pub const BID: Self = Self(1);
    /// Ask price.
    pub const ASK: Self = Self(2);
    /// Ask size.
    pub const ASK_SIZE: Self = Self(3);
    /// Last trade price.
    pub const LAST: Self = Self(4);
    /// Last trade size.
    pub const LAST_SIZE: Self = Self(5);
    /// Session high.
    pub const HIGH: Self = Self(6);
    /// Session low.
    pub const LOW: Self = Self(7);
    /// Session volume.
    pub const VOLUME: Self = Self(8);
    /// Previous close.
    pub const CLOSE: Self = Self(9);
    /// Session open.
    pub const OPEN: Self = Self(14);

    /// Gateway name of the tick field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "BID_SIZE",
            1 => "BID",
            2 => "ASK",
            3 => "ASK_SIZE",
            4 => "LAST",
            5 => "LAST_SIZE",
            6 => "HIGH",
            7 => "LOW",
            8 => "VOLUME",
            9 => "CLOSE",
            14 => "OPEN",
            45 => "LAST_TIMESTAMP",
            49 => "HALTED",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for TickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            "UNKNOWN" => write!(f, "TICK_{}", self.0),
            name => f.write_str(name),
        }
    }
}

/// Attributes attached to a price tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickAttrib {
    /// The price can be executed automatically.
    pub can_auto_execute: bool,
    /// The price lies outside the limit band.
    pub past_limit: bool,
    /// The price was set during pre-open.
    pub pre_open: bool,
}

impl TickAttrib {
    /// Decode the attribute bit mask sent with price ticks.
    #[must_use]
    pub const fn from_mask(mask: i64) -> Self {
        Self {
            can_auto_execute: mask & 1 != 0,
            past_limit: mask & 2 != 0,
            pre_open: mask & 4 != 0,
        }
    }
}

/// Market data delivery mode reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketDataType {
    /// Live data.
    RealTime,
    /// Last recorded data when the market is closed.
    Frozen,
    /// Delayed data.
    Delayed,
    /// Delayed data frozen at close.
    DelayedFrozen,
    /// Any other code.
    Unknown(i32),
}

impl From<i32> for MarketDataType {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::RealTime,
            2 => Self::Frozen,
            3 => Self::Delayed,
            4 => Self::DelayedFrozen,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for MarketDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RealTime => f.write_str("REALTIME"),
            Self::Frozen => f.write_str("FROZEN"),
            Self::Delayed => f.write_str("DELAYED"),
            Self::DelayedFrozen => f.write_str("DELAYED_FROZEN"),
            Self::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// One OHLCV bar from a historical pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar date as formatted by the gateway, e.g. "20240105".
    pub date: String,
    /// Opening price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub volume: i64,
    /// Number of trades in the bar.
    pub bar_count: i64,
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Date: {} Open: {} High: {} Low: {} Close: {} Volume: {} Count: {}",
            self.date, self.open, self.high, self.low, self.close, self.volume, self.bar_count
        )
    }
}

/// End-of-day quote persisted to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Symbol key.
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Date key.
    #[serde(rename = "Date")]
    pub date: String,
    /// Opening price.
    #[serde(rename = "Open")]
    pub open: Decimal,
    /// Closing price.
    #[serde(rename = "Close")]
    pub close: Decimal,
    /// High price.
    #[serde(rename = "High")]
    pub high: Decimal,
    /// Low price.
    #[serde(rename = "Low")]
    pub low: Decimal,
    /// Traded volume.
    #[serde(rename = "Volume")]
    pub volume: i64,
    /// Number of trades.
    #[serde(rename = "Count")]
    pub count: i64,
    /// Where the quote came from.
    #[serde(rename = "Source")]
    pub source: String,
}

impl QuoteRecord {
    /// Build a record from a historical bar.
    ///
    /// Prices go through their shortest textual form so that `1.1` is stored
    /// as `1.1` rather than its binary expansion.
    ///
    /// # Errors
    /// Returns `FeedlineError::Data` if a price is not finite.
    pub fn from_bar(
        symbol: impl Into<String>,
        bar: &Bar,
        source: impl Into<String>,
    ) -> Result<Self, FeedlineError> {
        Ok(Self {
            symbol: symbol.into(),
            date: bar.date.clone(),
            open: price(bar.open)?,
            close: price(bar.close)?,
            high: price(bar.high)?,
            low: price(bar.low)?,
            volume: bar.volume,
            count: bar.bar_count,
            source: source.into(),
        })
    }
}

fn price(value: f64) -> Result<Decimal, FeedlineError> {
    if !value.is_finite() {
        return Err(FeedlineError::Data(format!("non-finite price {value}")));
    }
    Decimal::from_str(&value.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{value:e}")))
        .map_err(|e| FeedlineError::Data(format!("price {value}: {e}")))
}
