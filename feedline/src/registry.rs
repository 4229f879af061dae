//! Outstanding requests per kind and the durable subscription set.

use std::collections::{BTreeMap, HashSet};

use feedline_types::{InstrumentDescriptor, PendingRequest, RequestId, RequestKind};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    request: PendingRequest,
    awaiting_reply: bool,
}

/// Lookup table for one request kind: request id to pending request.
///
/// An entry is *pending* until its first reply arrives and stays in the table
/// until its reply stream reaches its terminal marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTable {
    kind: RequestKind,
    entries: BTreeMap<RequestId, Entry>,
}

impl RequestTable {
    /// Empty table for `kind`.
    #[must_use]
    pub const fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Kind of request held by this table.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Track a freshly issued request as pending.
    pub fn insert(&mut self, request: PendingRequest) {
        self.entries.insert(
            request.id,
            Entry {
                request,
                awaiting_reply: true,
            },
        );
    }

    /// The request issued under `id`, if tracked.
    #[must_use]
    pub fn get(&self, id: RequestId) -> Option<&PendingRequest> {
        self.entries.get(&id).map(|e| &e.request)
    }

    /// Whether `id` is tracked.
    #[must_use]
    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Whether `id` is tracked and still waiting for its first reply.
    #[must_use]
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.awaiting_reply)
    }

    /// Record that a reply arrived for `id`. Returns the request if tracked.
    pub fn mark_answered(&mut self, id: RequestId) -> Option<&PendingRequest> {
        self.entries.get_mut(&id).map(|e| {
            e.awaiting_reply = false;
            &e.request
        })
    }

    /// Drop `id` at the end of its reply stream.
    pub fn remove(&mut self, id: RequestId) -> Option<PendingRequest> {
        self.entries.remove(&id).map(|e| e.request)
    }

    /// Swap the entry under `old` for a re-issued request.
    ///
    /// The replacement is pending regardless of the old entry's state.
    pub fn replace(&mut self, old: RequestId, request: PendingRequest) -> Option<PendingRequest> {
        let previous = self.remove(old);
        self.insert(request);
        previous
    }

    /// Put every answered entry back to waiting. Returns how many moved.
    ///
    /// Used when a new session starts: a stream cut off before its terminal
    /// marker will never finish under its old id.
    pub fn rearm(&mut self) -> usize {
        let mut moved = 0;
        for e in self.entries.values_mut().filter(|e| !e.awaiting_reply) {
            e.awaiting_reply = true;
            moved += 1;
        }
        moved
    }

    /// Drop every answered entry. Returns how many were dropped.
    pub fn discard_answered(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.awaiting_reply);
        before - self.entries.len()
    }

    /// Requests still waiting for their first reply, oldest id first.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingRequest> {
        self.entries
            .values()
            .filter(|e| e.awaiting_reply)
            .map(|e| e.request.clone())
            .collect()
    }

    /// Number of pending entries.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.entries.values().filter(|e| e.awaiting_reply).count()
    }

    /// Every tracked request, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest> {
        self.entries.values().map(|e| &e.request)
    }

    /// Whether any entry targets `symbol`.
    #[must_use]
    pub fn tracks_symbol(&self, symbol: &str) -> bool {
        self.iter().any(|r| r.instrument.symbol == symbol)
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All correlation state of the client.
///
/// Lives as long as the client: a reconnect replaces the session but keeps
/// these tables so outstanding requests can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRegistry {
    contracts: RequestTable,
    market_data: RequestTable,
    historical: RequestTable,
    subscriptions: HashSet<InstrumentDescriptor>,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contracts: RequestTable::new(RequestKind::ContractLookup),
            market_data: RequestTable::new(RequestKind::MarketData),
            historical: RequestTable::new(RequestKind::Historical),
            subscriptions: HashSet::new(),
        }
    }

    /// Table for `kind`.
    #[must_use]
    pub const fn table(&self, kind: RequestKind) -> &RequestTable {
        match kind {
            RequestKind::ContractLookup => &self.contracts,
            RequestKind::MarketData => &self.market_data,
            RequestKind::Historical => &self.historical,
        }
    }

    /// Mutable table for `kind`.
    pub const fn table_mut(&mut self, kind: RequestKind) -> &mut RequestTable {
        match kind {
            RequestKind::ContractLookup => &mut self.contracts,
            RequestKind::MarketData => &mut self.market_data,
            RequestKind::Historical => &mut self.historical,
        }
    }

    /// Track a newly issued request.
    pub fn register(&mut self, request: PendingRequest) {
        self.table_mut(request.kind).insert(request);
    }

    /// Record that `instrument` should be streaming. Returns `false` if it already was.
    pub fn subscribe(&mut self, instrument: InstrumentDescriptor) -> bool {
        self.subscriptions.insert(instrument)
    }

    /// Forget a subscription. Returns `false` if it was not recorded.
    pub fn unsubscribe(&mut self, instrument: &InstrumentDescriptor) -> bool {
        self.subscriptions.remove(instrument)
    }

    /// Whether `instrument` is subscribed.
    #[must_use]
    pub fn is_subscribed(&self, instrument: &InstrumentDescriptor) -> bool {
        self.subscriptions.contains(instrument)
    }

    /// Subscribed instruments, in no particular order.
    pub fn subscriptions(&self) -> impl Iterator<Item = &InstrumentDescriptor> {
        self.subscriptions.iter()
    }

    /// Whether `symbol` is already being looked up, requested or subscribed.
    #[must_use]
    pub fn tracks_symbol(&self, symbol: &str) -> bool {
        RequestKind::ALL
            .iter()
            .any(|k| self.table(*k).tracks_symbol(symbol))
            || self.subscriptions.iter().any(|i| i.symbol == symbol)
    }

    /// Prepare the tables for a new session. Returns the number of streams
    /// queued for replay.
    ///
    /// Answered contract lookups are dropped: their instruments are already
    /// subscribed and their follow-up requests are tracked. Market-data and
    /// historical entries interrupted mid-stream go back to waiting so the
    /// next replay re-issues them under fresh ids.
    pub fn restart_streams(&mut self) -> usize {
        self.contracts.discard_answered();
        self.market_data.rearm() + self.historical.rearm()
    }

    /// Whether any table holds a request still waiting for its first reply.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        RequestKind::ALL
            .iter()
            .any(|k| self.table(*k).pending_len() > 0)
    }
}
