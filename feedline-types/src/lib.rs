//! Feedline-specific data transfer objects, configuration and error types.
#![warn(missing_docs)]

mod config;
mod error;
mod instrument;
mod market;
mod message;
mod request;

pub use config::{
    BackoffConfig, ConnectionParams, DEFAULT_MAX_FRAME_LEN, HistoricalParams, MarketDataParams,
    SessionConfig,
};
pub use error::FeedlineError;
pub use instrument::{
    ContractDetails, InstrumentDescriptor, ProductType, SecurityDescription, SecurityRecord,
};
pub use market::{Bar, MarketDataType, QuoteRecord, TickAttrib, TickType};
pub use message::{Inbound, NO_VALID_ID, OutboundRequest};
pub use request::{OrderId, PendingRequest, RequestId, RequestKind};
