use std::sync::Arc;
use std::time::Duration;

use feedline_core::{Decoder, FieldCodec, LogSink, NullLog, RecordStore, Transport};
use feedline_types::{BackoffConfig, ConnectionParams, FeedlineError, SessionConfig};
use tokio::sync::watch;

use crate::context::Context;
use crate::ids::IdAllocator;
use crate::registry::SubscriptionRegistry;
use crate::session::Session;

/// Cloneable handle that asks a running client to stop.
///
/// Triggering is sticky: once set, every current and future wait on the
/// shutdown signal completes immediately.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger(Arc<watch::Sender<bool>>);

impl Default for ShutdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownTrigger {
    /// Fresh, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self(Arc::new(tx))
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// New receiver observing this signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

/// Long-lived gateway client.
///
/// Owns the current [`Session`], the [`SubscriptionRegistry`] and the id
/// allocator, and mutates them only from the task that drives the
/// consumption loop.
pub struct Client {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) decoder: Arc<dyn Decoder>,
    pub(crate) ctx: Context,
    pub(crate) params: ConnectionParams,
    pub(crate) cfg: SessionConfig,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) ids: IdAllocator,
    pub(crate) session: Option<Session>,
    pub(crate) generation: u64,
    pub(crate) trigger: ShutdownTrigger,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.name())
            .field("params", &self.params)
            .field("session", &self.session)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Correlation state.
    #[must_use]
    pub const fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Id allocator.
    #[must_use]
    pub const fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// The current (or most recently closed) session.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    /// Collaborators.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Handle that stops the consumption loop from another task.
    #[must_use]
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }
}

/// Builder for a [`Client`].
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn RecordStore>>,
    log: Arc<dyn LogSink>,
    decoder: Arc<dyn Decoder>,
    params: Option<ConnectionParams>,
    cfg: SessionConfig,
    trigger: Option<ShutdownTrigger>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default session settings.
    ///
    /// Behavior and trade-offs:
    /// - A transport, a record store and connection parameters are required.
    /// - Logging defaults to a sink that discards everything.
    /// - Neither market data nor historical pulls are requested unless enabled;
    ///   contract lookups always run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: None,
            store: None,
            log: Arc::new(NullLog),
            decoder: Arc::new(FieldCodec),
            params: None,
            cfg: SessionConfig::default(),
            trigger: None,
        }
    }

    /// Set the gateway transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the record store providing the instrument universe and receiving quotes.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the business log sink.
    #[must_use]
    pub fn log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Replace the frame decoder.
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Where and as whom to connect.
    #[must_use]
    pub fn connection(mut self, params: ConnectionParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Replace the whole session configuration.
    #[must_use]
    pub fn config(mut self, cfg: SessionConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Subscribe to market data for every validated instrument.
    #[must_use]
    pub const fn realtime(mut self, yes: bool) -> Self {
        self.cfg.realtime = yes;
        self
    }

    /// Pull historical bars for every validated instrument.
    #[must_use]
    pub const fn historical(mut self, yes: bool) -> Self {
        self.cfg.historical = yes;
        self
    }

    /// Backoff used while the record store comes back empty.
    ///
    /// Behavior and trade-offs:
    /// - Waits run on the loop task, so no frames are consumed while backing off.
    /// - Higher jitter spreads out retries at the cost of less predictable timing.
    #[must_use]
    pub const fn backoff(mut self, cfg: BackoffConfig) -> Self {
        self.cfg.backoff = cfg;
        self
    }

    /// Longest wait on the inbound queue per loop iteration.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.poll_interval = interval;
        self
    }

    /// Idle time after which the liveness probe and replay run.
    ///
    /// Behavior and trade-offs:
    /// - Shorter thresholds detect stalls sooner but re-issue unanswered
    ///   requests more often; replay is not deduplicated.
    #[must_use]
    pub const fn liveness_threshold(mut self, threshold: Duration) -> Self {
        self.cfg.liveness_threshold = threshold;
        self
    }

    /// Share a shutdown signal with the caller instead of creating one.
    #[must_use]
    pub fn shutdown(mut self, trigger: ShutdownTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the transport, record store or connection
    /// parameters are missing, or the configuration is unusable.
    pub fn build(self) -> Result<Client, FeedlineError> {
        let transport = self.transport.ok_or_else(|| {
            FeedlineError::InvalidArg("no transport configured; call transport(...)".into())
        })?;
        let store = self.store.ok_or_else(|| {
            FeedlineError::InvalidArg("no record store configured; call store(...)".into())
        })?;
        let params = self.params.ok_or_else(|| {
            FeedlineError::InvalidArg("no connection parameters; call connection(...)".into())
        })?;
        if self.cfg.poll_interval.is_zero() {
            return Err(FeedlineError::InvalidArg(
                "poll interval must be positive".into(),
            ));
        }
        if self.cfg.inbound_capacity == 0 {
            return Err(FeedlineError::InvalidArg(
                "inbound queue capacity must be positive".into(),
            ));
        }

        let trigger = self.trigger.unwrap_or_default();
        Ok(Client {
            transport,
            decoder: self.decoder,
            ctx: Context {
                log: self.log,
                store,
                shutdown: trigger.subscribe(),
            },
            params,
            cfg: self.cfg,
            registry: SubscriptionRegistry::new(),
            ids: IdAllocator::new(),
            session: None,
            generation: 0,
            trigger,
        })
    }
}
