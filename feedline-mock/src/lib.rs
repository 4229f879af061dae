//! Test doubles for the feedline client.
//!
//! - [`MockTransport`] hands out an inbound queue the test fills through its
//!   [`MockTransportController`] and records every request the client sends.
//! - [`MockStore`] keeps quotes in memory and can answer "absent" or fail on demand.
//! - [`RecordingLog`] keeps every business log record for assertions.
//! - [`frames`] builds inbound payloads; [`fixtures`] holds reference data.

pub mod fixtures;
pub mod frames;
mod log;
mod store;
mod transport;

pub use log::RecordingLog;
pub use store::MockStore;
pub use transport::{
    ConnectBehavior, MOCK_INBOX_CAPACITY, MockTransport, MockTransportController,
};
