//! feedline-core
//!
//! Collaborator traits, wire codec and task handles shared by the feedline
//! gateway client and its transports.
//!
//! - `transport`: the `Transport` trait and the `Inbox` frame queue.
//! - `store`: the `RecordStore` trait for reference and quote data.
//! - `log`: the `LogSink` trait for business log records.
//! - `codec`: field splitting, frame headers and the `FieldCodec`.
//! - `reader`: `ReaderHandle` for a transport's reader task.
//!
//! Async runtime (Tokio)
//! ---------------------
//! This crate assumes the Tokio ecosystem as the async runtime:
//!
//! - `transport::Inbox` is a bounded `tokio::sync::mpsc::Receiver<Vec<u8>>`.
//! - `reader::ReaderHandle` wraps `tokio::task::JoinHandle<()>` and uses
//!   `tokio::sync::oneshot::Sender<()>` for cooperative shutdown.
//!
//! Code that uses transports must run under a Tokio 1.x runtime.
//!
#![warn(missing_docs)]

/// Frame and field codec for the gateway protocol.
pub mod codec;
/// Business log sink.
pub mod log;
/// Reader task handle used by transports and tests.
pub mod reader;
/// Record store trait.
pub mod store;
/// Transport trait.
pub mod transport;
pub mod types;

pub use codec::{Decoder, Encoder, FieldCodec, MAX_FRAME_LEN, encode_fields, read_fields};
pub use log::{LogLevel, LogSink, NullLog};
pub use reader::ReaderHandle;
pub use store::RecordStore;
pub use transport::{Inbox, Transport};
pub use types::*;
