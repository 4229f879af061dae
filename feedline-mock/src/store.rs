use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use feedline_core::{FeedlineError, QuoteRecord, RecordStore, SecurityRecord};

#[derive(Default)]
struct StoreState {
    instruments: Vec<SecurityRecord>,
    misses: usize,
    list_error: Option<FeedlineError>,
    upsert_error: Option<FeedlineError>,
    quotes: BTreeMap<(String, String), QuoteRecord>,
    upserts: Vec<QuoteRecord>,
    list_calls: usize,
}

/// In-memory record store with scriptable absence and failures.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<StoreState>,
}

impl MockStore {
    /// Store holding `instruments`.
    #[must_use]
    pub fn new(instruments: Vec<SecurityRecord>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                instruments,
                ..StoreState::default()
            }),
        }
    }

    /// Replace the instrument universe.
    pub async fn set_instruments(&self, instruments: Vec<SecurityRecord>) {
        self.state.lock().await.instruments = instruments;
    }

    /// Answer the next `n` reads of the universe with "absent".
    pub async fn set_misses(&self, n: usize) {
        self.state.lock().await.misses = n;
    }

    /// Fail every read of the universe with `error`; `None` restores success.
    pub async fn fail_list(&self, error: Option<FeedlineError>) {
        self.state.lock().await.list_error = error;
    }

    /// Fail every quote upsert with `error`; `None` restores success.
    pub async fn fail_upserts(&self, error: Option<FeedlineError>) {
        self.state.lock().await.upsert_error = error;
    }

    /// Number of reads of the universe so far.
    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }

    /// Every upsert attempt that succeeded, in order.
    pub async fn upserts(&self) -> Vec<QuoteRecord> {
        self.state.lock().await.upserts.clone()
    }

    /// Stored quote for `symbol` on `date`.
    pub async fn quote(&self, symbol: &str, date: &str) -> Option<QuoteRecord> {
        self.state
            .lock()
            .await
            .quotes
            .get(&(symbol.to_string(), date.to_string()))
            .cloned()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    fn name(&self) -> &'static str {
        "mock-store"
    }

    async fn list_instruments(&self) -> Result<Option<Vec<SecurityRecord>>, FeedlineError> {
        let mut guard = self.state.lock().await;
        guard.list_calls += 1;
        if let Some(e) = &guard.list_error {
            return Err(e.clone());
        }
        if guard.misses > 0 {
            guard.misses -= 1;
            return Ok(None);
        }
        Ok(Some(guard.instruments.clone()))
    }

    async fn upsert_quote(&self, quote: &QuoteRecord) -> Result<(), FeedlineError> {
        let mut guard = self.state.lock().await;
        if let Some(e) = &guard.upsert_error {
            return Err(e.clone());
        }
        guard
            .quotes
            .insert((quote.symbol.clone(), quote.date.clone()), quote.clone());
        guard.upserts.push(quote.clone());
        Ok(())
    }
}
