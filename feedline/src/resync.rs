//! Bootstrap on (re)connect and replay of outstanding requests.

use core::fmt;
use std::sync::Arc;

use feedline_types::{
    FeedlineError, InstrumentDescriptor, OutboundRequest, PendingRequest, RequestId, RequestKind,
};

use crate::connection::LoopEvent;
use crate::core::Client;
use crate::retry::reliable;

/// Count of requests re-issued by one replay, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Contract lookups re-issued.
    pub contracts: usize,
    /// Market-data requests re-issued.
    pub market_data: usize,
    /// Historical requests re-issued.
    pub historical: usize,
}

impl ReplaySummary {
    /// Total requests re-issued.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.contracts + self.market_data + self.historical
    }

    /// Whether nothing was re-issued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }

    const fn bump(&mut self, kind: RequestKind) {
        match kind {
            RequestKind::ContractLookup => self.contracts += 1,
            RequestKind::MarketData => self.market_data += 1,
            RequestKind::Historical => self.historical += 1,
        }
    }
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contract lookups, {} historical, {} market-data requests",
            self.contracts, self.historical, self.market_data
        )
    }
}

impl Client {
    /// Handle the gateway's first valid id.
    ///
    /// Seeds both id counters. On the first id of a session this also moves
    /// the loop to `Running`, replays whatever is still outstanding from an
    /// earlier session and bootstraps the instrument universe. A repeated id
    /// within a running session only reseeds.
    pub(crate) async fn on_next_valid_id(&mut self, order_id: i64) -> Result<(), FeedlineError> {
        let first_request = self.ids.seed(order_id);
        self.ctx.log.info(&format!(
            "nextValidId {order_id}; request ids start at {first_request}"
        ));

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let before = session.state();
        session.set_state(before.on(LoopEvent::Seeded));
        if session.state() == before {
            return Ok(());
        }

        if self.registry.has_pending() {
            let summary = self.replay().await?;
            self.ctx.log.info(&format!("replayed {summary}"));
        }
        self.bootstrap().await
    }

    /// Fetch the instrument universe and look up every enabled instrument
    /// that is not already tracked.
    pub(crate) async fn bootstrap(&mut self) -> Result<(), FeedlineError> {
        self.ctx.log.info(&format!(
            "start for realtime {} and historical {}",
            self.cfg.realtime, self.cfg.historical
        ));

        let store = Arc::clone(&self.ctx.store);
        let log = Arc::clone(&self.ctx.log);
        let mut shutdown = self.ctx.shutdown.clone();
        let records = reliable(&self.cfg.backoff, &mut shutdown, || {
            let store = Arc::clone(&store);
            let log = Arc::clone(&log);
            async move {
                match store.list_instruments().await {
                    Ok(records) => records,
                    Err(e) => {
                        log.error(&format!("reading instruments from {}: {e}", store.name()));
                        None
                    }
                }
            }
        })
        .await;

        let Some(records) = records else {
            self.ctx
                .log
                .error("instrument universe unavailable; no lookups issued");
            return Ok(());
        };

        for record in records.iter().filter(|r| r.subscription_enabled) {
            let instrument = record.descriptor();
            if self.registry.tracks_symbol(&instrument.symbol) {
                self.ctx
                    .log
                    .debug(&format!("{} already tracked", instrument.symbol));
                continue;
            }
            self.request_contract(instrument).await?;
        }
        Ok(())
    }

    /// Allocate an id, register and send a contract lookup.
    ///
    /// # Errors
    /// Id allocation or transport errors.
    pub async fn request_contract(
        &mut self,
        instrument: InstrumentDescriptor,
    ) -> Result<RequestId, FeedlineError> {
        self.issue(RequestKind::ContractLookup, instrument).await
    }

    /// Request market data and/or history for an instrument validated by the
    /// gateway, then record the durable subscription.
    pub(crate) async fn subscribe_validated(
        &mut self,
        validated: InstrumentDescriptor,
    ) -> Result<(), FeedlineError> {
        if self.cfg.realtime {
            self.issue(RequestKind::MarketData, validated.clone()).await?;
        }
        if self.cfg.historical {
            self.issue(RequestKind::Historical, validated.clone()).await?;
        }
        if self.registry.subscribe(validated.clone()) {
            self.ctx
                .log
                .info(&format!("subscribed {}", validated.display_symbol()));
        }
        Ok(())
    }

    /// Probe the gateway and re-issue everything still waiting for a reply.
    ///
    /// Sends a current-time request, then re-issues pending contract lookups
    /// and, when enabled, pending historical and market-data requests, each
    /// under a new id that replaces the old entry. Calling this twice without
    /// replies in between re-issues the same instruments twice.
    ///
    /// # Errors
    /// Transport errors from the probe or a re-issue, or id exhaustion.
    pub async fn verify(&mut self) -> Result<ReplaySummary, FeedlineError> {
        self.transport.send(&OutboundRequest::CurrentTime).await?;
        if let Some(session) = self.session.as_mut() {
            session.touch();
        }
        if !self.ids.is_seeded() {
            return Ok(ReplaySummary::default());
        }
        self.replay().await
    }

    async fn replay(&mut self) -> Result<ReplaySummary, FeedlineError> {
        let mut summary = ReplaySummary::default();
        for kind in RequestKind::ALL {
            let enabled = match kind {
                RequestKind::ContractLookup => true,
                RequestKind::MarketData => self.cfg.realtime,
                RequestKind::Historical => self.cfg.historical,
            };
            if !enabled {
                continue;
            }
            for stale in self.registry.table(kind).pending() {
                let id = self.ids.next_request()?;
                let fresh = stale.reissued(id);
                let request = self.outbound_for(&fresh);
                self.registry.table_mut(kind).replace(stale.id, fresh);
                self.ctx.log.info(&format!(
                    "re-request {kind} for {} as {id} (was {})",
                    stale.instrument.display_symbol(),
                    stale.id
                ));
                self.transport.send(&request).await?;
                summary.bump(kind);
            }
        }
        Ok(summary)
    }

    async fn issue(
        &mut self,
        kind: RequestKind,
        instrument: InstrumentDescriptor,
    ) -> Result<RequestId, FeedlineError> {
        let id = self.ids.next_request()?;
        let pending = PendingRequest::new(id, kind, instrument);
        let request = self.outbound_for(&pending);
        self.ctx.log.info(&format!(
            "request {kind} for {} as {id}",
            pending.instrument.display_symbol()
        ));
        self.registry.register(pending);
        self.transport.send(&request).await?;
        Ok(id)
    }

    fn outbound_for(&self, pending: &PendingRequest) -> OutboundRequest {
        let id = pending.id;
        let instrument = pending.instrument.clone();
        match pending.kind {
            RequestKind::ContractLookup => OutboundRequest::ContractDetails { id, instrument },
            RequestKind::MarketData => OutboundRequest::MarketData {
                id,
                instrument,
                params: self.cfg.market_data.clone(),
            },
            RequestKind::Historical => OutboundRequest::HistoricalData {
                id,
                instrument,
                params: self.cfg.history.clone(),
            },
        }
    }
}
