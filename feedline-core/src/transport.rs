use async_trait::async_trait;

use feedline_types::{ConnectionParams, FeedlineError, OutboundRequest};

/// Receiving end of the bounded queue a transport's reader task fills with raw frames.
///
/// The queue closing is how the consumption loop learns the connection was lost.
pub type Inbox = tokio::sync::mpsc::Receiver<Vec<u8>>;

/// A connection to the market-data gateway.
///
/// Implementations own a reader task that pushes every length-delimited frame
/// (without its length prefix) into the returned [`Inbox`]. Outbound requests
/// are typed; the implementation encodes them for the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Open a session and start the reader task.
    ///
    /// # Errors
    /// Returns `FeedlineError::Transport` if the gateway cannot be reached or
    /// the handshake fails.
    async fn connect(&self, params: &ConnectionParams) -> Result<Inbox, FeedlineError>;

    /// Whether the session is currently open.
    fn is_connected(&self) -> bool;

    /// Send one request.
    ///
    /// # Errors
    /// Returns `FeedlineError::NotConnected` when no session is open, or
    /// `FeedlineError::Transport` if the write fails.
    async fn send(&self, request: &OutboundRequest) -> Result<(), FeedlineError>;

    /// Close the session and stop the reader task. Closing a closed
    /// transport is a no-op.
    async fn disconnect(&self);
}
