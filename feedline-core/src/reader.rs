use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a transport's reader task.
///
/// The reader owns the socket's read half and pushes frames into the inbound
/// queue. Dropping the handle signals the task to stop and aborts it if it
/// is still running, so a transport never leaks its reader.
#[derive(Debug)]
pub struct ReaderHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ReaderHandle {
    /// Wrap a spawned reader task and the sender half of its stop signal.
    #[must_use]
    pub const fn new(task: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            inner: Some(task),
            stop_tx: Some(stop_tx),
        }
    }

    /// Whether the reader task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal the reader to stop and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.inner.take() {
            let _ = task.await;
        }
    }

    /// Abort the reader immediately.
    pub fn abort(mut self) {
        self.stop_tx.take();
        if let Some(task) = self.inner.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!("aborting transport reader task");
            task.abort();
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.inner.take()
            && !task.is_finished()
        {
            task.abort();
        }
    }
}
