use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the feedline workspace.
///
/// This wraps transport failures, protocol violations on inbound frames,
/// record-store failures, allocator misuse and argument validation errors.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FeedlineError {
    /// An operation needed a live session but the transport is not connected.
    #[error("not connected")]
    NotConnected,

    /// The transport failed while connecting, sending or receiving.
    #[error("{transport} failed: {msg}")]
    Transport {
        /// Transport name that failed.
        transport: String,
        /// Human-readable error message.
        msg: String,
    },

    /// An inbound frame exceeded the maximum frame length.
    #[error("bad message length: {len} exceeds {max}")]
    OversizedFrame {
        /// Length of the offending frame in bytes.
        len: usize,
        /// Configured maximum frame length in bytes.
        max: usize,
    },

    /// An inbound frame could not be split or interpreted.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The record store failed to serve a read or a write.
    #[error("{store} failed: {msg}")]
    Store {
        /// Store name that failed.
        store: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Ids were requested before the gateway provided a starting id.
    #[error("request ids have not been seeded by the gateway")]
    Unseeded,

    /// The id counter reached the end of its range.
    #[error("id space exhausted")]
    IdSpaceExhausted,

    /// Issues with the returned or expected data (missing fields, bad numbers).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "securities file".
        what: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl FeedlineError {
    /// Helper: build a `Transport` error with the transport name and message.
    pub fn transport(transport: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            transport: transport.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Store` error with the store name and message.
    pub fn store(store: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Store {
            store: store.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Malformed` error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Returns true if this error ends the current session.
    ///
    /// Protocol violations and transport failures are fatal; store failures,
    /// data issues and validation errors only affect the item being processed.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::Transport { .. }
                | Self::OversizedFrame { .. }
                | Self::Malformed(_)
        )
    }

    /// Returns true if this error is a protocol violation on an inbound frame.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::OversizedFrame { .. } | Self::Malformed(_))
    }
}
