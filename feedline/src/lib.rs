//! Feedline keeps one long-lived session to a market-data gateway.
//!
//! Overview
//! - Allocates request ids seeded by the gateway and pairs every reply with
//!   the request that caused it, however late it arrives.
//! - Runs a single cooperative consumption loop over the transport's inbound
//!   queue, probing the gateway when the session goes quiet.
//! - On (re)connect, replays every request still waiting for a reply under a
//!   fresh id, then looks up any instrument of the universe not yet tracked.
//! - Forwards historical bars to a record store as quote records.
//!
//! Key behaviors and trade-offs
//! - Correlation state lives as long as the `Client`, not the session; it is
//!   never persisted, so a process restart starts from the record store again.
//! - Replay is best-effort and not deduplicated: an unanswered request is
//!   re-issued on every probe until something answers it.
//! - Reading the instrument universe backs off exponentially (2s, 4s, ...,
//!   1024s by default) on the loop task; the wait ends early on shutdown.
//! - Oversized or undecodable frames end the session; there is no in-session
//!   recovery from a protocol violation.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use feedline::{Client, ConnectionParams};
//!
//! let mut client = Client::builder()
//!     .transport(Arc::new(my_transport))
//!     .store(Arc::new(my_store))
//!     .connection(ConnectionParams::new("127.0.0.1", 4002, 7))
//!     .realtime(true)
//!     .historical(true)
//!     .build()?;
//!
//! let stop = client.shutdown_trigger();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     stop.trigger();
//! });
//!
//! match client.run().await? {
//!     feedline::LoopExit::Interrupted => {}
//!     other => eprintln!("session ended: {other}"),
//! }
//! ```
#![warn(missing_docs)]

mod connection;
mod context;
pub(crate) mod core;
mod dispatch;
/// Request and order id allocation.
pub mod ids;
/// Outstanding request tables and the subscription set.
pub mod registry;
mod resync;
/// Exponential backoff helper.
pub mod retry;
mod session;

pub use connection::{LoopEvent, LoopExit, LoopState};
pub use context::Context;
pub use core::{Client, ClientBuilder, ShutdownTrigger};
pub use ids::{IdAllocator, IdCounter};
pub use registry::{RequestTable, SubscriptionRegistry};
pub use resync::ReplaySummary;
pub use retry::reliable;
pub use session::Session;

// Re-export core types for convenience
pub use feedline_core::{
    BackoffConfig, Bar, ConnectionParams, ContractDetails, FeedlineError, HistoricalParams,
    Inbound, Inbox, InstrumentDescriptor, LogLevel, LogSink, MarketDataParams, OutboundRequest,
    PendingRequest, ProductType, QuoteRecord, RecordStore, RequestId, RequestKind,
    SecurityRecord, SessionConfig, TickType, Transport,
};
