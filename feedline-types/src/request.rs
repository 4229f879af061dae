use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentDescriptor;

/// Correlation token pairing an outbound request with its replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl RequestId {
    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier in the order id space; independent from request ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of request whose replies are correlated by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Contract details lookup for an instrument.
    ContractLookup,
    /// Market data (snapshot or stream).
    MarketData,
    /// Historical bar pull.
    Historical,
}

impl RequestKind {
    /// All request kinds in replay order.
    pub const ALL: [Self; 3] = [Self::ContractLookup, Self::Historical, Self::MarketData];

    /// Stable identifier for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContractLookup => "contract-details",
            Self::MarketData => "market-data",
            Self::Historical => "historical-data",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-flight exchange with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    /// Id the request was issued under.
    pub id: RequestId,
    /// What was asked for.
    pub kind: RequestKind,
    /// Instrument the request targets.
    pub instrument: InstrumentDescriptor,
    /// When the request was sent.
    pub issued_at: DateTime<Utc>,
}

impl PendingRequest {
    /// Build a pending request stamped with the current time.
    #[must_use]
    pub fn new(id: RequestId, kind: RequestKind, instrument: InstrumentDescriptor) -> Self {
        Self {
            id,
            kind,
            instrument,
            issued_at: Utc::now(),
        }
    }

    /// The same request re-issued under a new id.
    #[must_use]
    pub fn reissued(&self, id: RequestId) -> Self {
        Self::new(id, self.kind, self.instrument.clone())
    }
}
