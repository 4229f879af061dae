//! Re-export of the shared types from `feedline-types`.
// Downstream crates can depend on `feedline-core` only.

pub use feedline_types::{
    BackoffConfig, ConnectionParams, DEFAULT_MAX_FRAME_LEN, HistoricalParams, MarketDataParams,
    SessionConfig,
};
pub use feedline_types::{
    Bar, MarketDataType, QuoteRecord, TickAttrib, TickType,
};
pub use feedline_types::{
    ContractDetails, InstrumentDescriptor, ProductType, SecurityDescription, SecurityRecord,
};
pub use feedline_types::{FeedlineError, Inbound, NO_VALID_ID, OutboundRequest};
pub use feedline_types::{OrderId, PendingRequest, RequestId, RequestKind};
