use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use feedline_core::{
    ConnectionParams, FeedlineError, Inbox, OutboundRequest, RequestId, RequestKind, Transport,
    encode_fields,
};

/// Capacity of the inbound queue handed out by the mock.
pub const MOCK_INBOX_CAPACITY: usize = 1024;

/// Instruction for how `connect` should behave.
#[derive(Clone, Debug)]
pub enum ConnectBehavior {
    /// Open a session.
    Accept,
    /// Fail immediately with the provided error.
    Fail(FeedlineError),
}

struct InternalState {
    connect_behavior: ConnectBehavior,
    on_connect: Vec<Vec<u8>>,
    frame_tx: Option<mpsc::Sender<Vec<u8>>>,
    sent: Vec<OutboundRequest>,
    send_failure: Option<FeedlineError>,
    connect_params: Vec<ConnectionParams>,
    disconnects: usize,
}

impl Default for InternalState {
    fn default() -> Self {
        Self {
            connect_behavior: ConnectBehavior::Accept,
            on_connect: Vec::new(),
            frame_tx: None,
            sent: Vec::new(),
            send_failure: None,
            connect_params: Vec::new(),
            disconnects: 0,
        }
    }
}

/// Controller handle used by tests to drive the mock transport from the outside.
#[derive(Clone)]
pub struct MockTransportController {
    state: Arc<Mutex<InternalState>>,
    connected: Arc<AtomicBool>,
}

impl MockTransportController {
    /// Set how the next `connect` calls behave.
    pub async fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        self.state.lock().await.connect_behavior = behavior;
    }

    /// Frames delivered, in order, right after every successful connect.
    pub async fn script_on_connect(&self, frames: Vec<Vec<u8>>) {
        self.state.lock().await.on_connect = frames;
    }

    /// Push one frame payload into the open session.
    ///
    /// Returns `false` if no session is open or the client dropped its inbox.
    pub async fn push_frame(&self, frame: Vec<u8>) -> bool {
        // Extract a sender clone without holding the lock across await
        let tx = self.state.lock().await.frame_tx.clone();
        match tx {
            Some(tx) => tx.send(frame).await.is_ok(),
            None => false,
        }
    }

    /// Encode `fields` and push them as one frame.
    pub async fn push_fields(&self, fields: &[&str]) -> bool {
        self.push_frame(encode_fields(fields)).await
    }

    /// Simulate the gateway closing the connection.
    ///
    /// Frames already queued are still delivered before the inbox closes.
    pub async fn drop_connection(&self) {
        self.state.lock().await.frame_tx.take();
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Make every subsequent `send` fail with `error`; `None` restores success.
    pub async fn fail_sends(&self, error: Option<FeedlineError>) {
        self.state.lock().await.send_failure = error;
    }

    /// Every request sent so far, in order.
    pub async fn sent(&self) -> Vec<OutboundRequest> {
        self.state.lock().await.sent.clone()
    }

    /// Ids of the requests of `kind` sent so far, in order.
    pub async fn sent_ids(&self, kind: RequestKind) -> Vec<RequestId> {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter_map(OutboundRequest::correlation)
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Symbols of the requests of `kind` sent so far, in order.
    pub async fn sent_symbols(&self, kind: RequestKind) -> Vec<String> {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter(|r| r.correlation().is_some_and(|(_, k)| k == kind))
            .filter_map(|r| r.instrument().map(|i| i.symbol.clone()))
            .collect()
    }

    /// Number of current-time probes sent so far.
    pub async fn probe_count(&self) -> usize {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter(|r| matches!(r, OutboundRequest::CurrentTime))
            .count()
    }

    /// Forget the request log.
    pub async fn clear_sent(&self) {
        self.state.lock().await.sent.clear();
    }

    /// Parameters of every successful connect, in order.
    pub async fn connects(&self) -> Vec<ConnectionParams> {
        self.state.lock().await.connect_params.clone()
    }

    /// Number of `disconnect` calls.
    pub async fn disconnect_count(&self) -> usize {
        self.state.lock().await.disconnects
    }
}

/// A transport that defers all behavior to an external controller.
pub struct MockTransport {
    state: Arc<Mutex<InternalState>>,
    connected: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport and its controller.
    #[must_use]
    pub fn new_with_controller() -> (Arc<dyn Transport>, MockTransportController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let connected = Arc::new(AtomicBool::new(false));
        let controller = MockTransportController {
            state: Arc::clone(&state),
            connected: Arc::clone(&connected),
        };
        let me = Arc::new(Self { state, connected });
        (me as Arc<dyn Transport>, controller)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<Inbox, FeedlineError> {
        let mut guard = self.state.lock().await;
        if let ConnectBehavior::Fail(e) = &guard.connect_behavior {
            return Err(e.clone());
        }
        let (tx, rx) = mpsc::channel(MOCK_INBOX_CAPACITY);
        for frame in &guard.on_connect {
            tx.try_send(frame.clone())
                .map_err(|e| FeedlineError::transport("mock", e.to_string()))?;
        }
        guard.frame_tx = Some(tx);
        guard.connect_params.push(params.clone());
        self.connected.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, request: &OutboundRequest) -> Result<(), FeedlineError> {
        let mut guard = self.state.lock().await;
        if !self.connected.load(Ordering::SeqCst) {
            return Err(FeedlineError::NotConnected);
        }
        if let Some(e) = &guard.send_failure {
            return Err(e.clone());
        }
        guard.sent.push(request.clone());
        Ok(())
    }

    async fn disconnect(&self) {
        let mut guard = self.state.lock().await;
        guard.frame_tx.take();
        guard.disconnects += 1;
        self.connected.store(false, Ordering::SeqCst);
    }
}
