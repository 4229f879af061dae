//! Typed messages exchanged with the gateway.

use serde::{Deserialize, Serialize};

use crate::config::{HistoricalParams, MarketDataParams};
use crate::instrument::{ContractDetails, InstrumentDescriptor};
use crate::market::{Bar, MarketDataType, TickAttrib, TickType};
use crate::request::{RequestId, RequestKind};

/// Request id the gateway uses for messages not tied to a request.
pub const NO_VALID_ID: i64 = -1;

/// Requests the client sends to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundRequest {
    /// Look up contract details for an instrument.
    ContractDetails {
        /// Correlation id.
        id: RequestId,
        /// Instrument to look up.
        instrument: InstrumentDescriptor,
    },
    /// Subscribe to (or snapshot) market data.
    MarketData {
        /// Correlation id.
        id: RequestId,
        /// Validated instrument.
        instrument: InstrumentDescriptor,
        /// Tick list and snapshot flags.
        params: MarketDataParams,
    },
    /// Pull historical bars.
    HistoricalData {
        /// Correlation id.
        id: RequestId,
        /// Validated instrument.
        instrument: InstrumentDescriptor,
        /// Window and bar parameters.
        params: HistoricalParams,
    },
    /// Ask for the gateway's clock; used as the liveness probe.
    CurrentTime,
}

impl OutboundRequest {
    /// Correlation id and kind, if this request expects correlated replies.
    #[must_use]
    pub const fn correlation(&self) -> Option<(RequestId, RequestKind)> {
        match self {
            Self::ContractDetails { id, .. } => Some((*id, RequestKind::ContractLookup)),
            Self::MarketData { id, .. } => Some((*id, RequestKind::MarketData)),
            Self::HistoricalData { id, .. } => Some((*id, RequestKind::Historical)),
            Self::CurrentTime => None,
        }
    }

    /// Instrument targeted by this request, if any.
    #[must_use]
    pub const fn instrument(&self) -> Option<&InstrumentDescriptor> {
        match self {
            Self::ContractDetails { instrument, .. }
            | Self::MarketData { instrument, .. }
            | Self::HistoricalData { instrument, .. } => Some(instrument),
            Self::CurrentTime => None,
        }
    }
}

/// Messages the gateway pushes to the client, one variant per handled kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inbound {
    /// Handshake completion: the first usable id.
    NextValidId {
        /// First valid order id; also seeds request ids.
        order_id: i64,
    },
    /// One contract matching a lookup.
    ContractDetails {
        /// Lookup id.
        req_id: RequestId,
        /// Returned details.
        details: ContractDetails,
    },
    /// No more contracts for a lookup.
    ContractDetailsEnd {
        /// Lookup id.
        req_id: RequestId,
    },
    /// One historical bar.
    HistoricalData {
        /// Historical request id.
        req_id: RequestId,
        /// The bar.
        bar: Bar,
    },
    /// End of a historical pull.
    HistoricalDataEnd {
        /// Historical request id.
        req_id: RequestId,
        /// Window start as reported by the gateway.
        start: String,
        /// Window end as reported by the gateway.
        end: String,
    },
    /// A price tick.
    TickPrice {
        /// Market-data request id.
        req_id: RequestId,
        /// Tick field.
        tick_type: TickType,
        /// Price value.
        price: f64,
        /// Price attributes.
        attrib: TickAttrib,
    },
    /// A size tick.
    TickSize {
        /// Market-data request id.
        req_id: RequestId,
        /// Tick field.
        tick_type: TickType,
        /// Size value.
        size: i64,
    },
    /// End of a market-data snapshot.
    TickSnapshotEnd {
        /// Market-data request id.
        req_id: RequestId,
    },
    /// Delivery mode for a market-data request.
    MarketDataType {
        /// Market-data request id.
        req_id: RequestId,
        /// Delivery mode.
        kind: MarketDataType,
    },
    /// The gateway's clock, in seconds since the epoch.
    CurrentTime {
        /// Server time.
        time: i64,
    },
    /// Error or notice from the gateway.
    Error {
        /// Request id the notice refers to, or `NO_VALID_ID`.
        req_id: i64,
        /// Gateway error code.
        code: i32,
        /// Gateway message.
        message: String,
    },
}

impl Inbound {
    /// Stable name of the message kind for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NextValidId { .. } => "nextValidId",
            Self::ContractDetails { .. } => "contractDetails",
            Self::ContractDetailsEnd { .. } => "contractDetailsEnd",
            Self::HistoricalData { .. } => "historicalData",
            Self::HistoricalDataEnd { .. } => "historicalDataEnd",
            Self::TickPrice { .. } => "tickPrice",
            Self::TickSize { .. } => "tickSize",
            Self::TickSnapshotEnd { .. } => "tickSnapshotEnd",
            Self::MarketDataType { .. } => "marketDataType",
            Self::CurrentTime { .. } => "currentTime",
            Self::Error { .. } => "error",
        }
    }
}
