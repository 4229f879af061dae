use async_trait::async_trait;

use feedline_types::{FeedlineError, QuoteRecord, SecurityRecord};

/// Durable reference and quote data.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Read the instrument universe.
    ///
    /// `Ok(None)` means the data is transiently absent and the read may be retried.
    ///
    /// # Errors
    /// Returns `FeedlineError::Store` when the store itself fails.
    async fn list_instruments(&self) -> Result<Option<Vec<SecurityRecord>>, FeedlineError>;

    /// Insert or replace the quote keyed by symbol and date.
    ///
    /// # Errors
    /// Returns `FeedlineError::Store` when the write fails.
    async fn upsert_quote(&self, quote: &QuoteRecord) -> Result<(), FeedlineError>;
}
