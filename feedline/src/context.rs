use std::sync::Arc;

use feedline_core::{LogSink, RecordStore};
use tokio::sync::watch;

/// Collaborators shared by every component of a client.
///
/// Built once by [`crate::ClientBuilder`] and carried by the client; there is
/// no global logger or store.
#[derive(Clone)]
pub struct Context {
    /// Business log destination.
    pub log: Arc<dyn LogSink>,
    /// Reference and quote data.
    pub store: Arc<dyn RecordStore>,
    /// Flips to `true` on operator interrupt or an explicit disconnect request.
    pub shutdown: watch::Receiver<bool>,
}

impl Context {
    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("store", &self.store.name())
            .field("shutdown", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}
