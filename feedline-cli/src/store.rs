//! Record store over two local files: a JSON array of security records and
//! a JSON Lines file of quotes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use feedline_core::RecordStore;
use feedline_types::{FeedlineError, QuoteRecord, SecurityRecord};
use tokio::sync::Mutex;

const STORE_NAME: &str = "json-file";

/// File-backed [`RecordStore`].
///
/// An empty securities file reads as a transient absence (a writer may be
/// mid-update); a missing one is an error. Quote upserts rewrite the quote
/// file with at most one line per symbol and date.
#[derive(Debug)]
pub struct JsonFileStore {
    securities: PathBuf,
    quotes: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store reading `securities` and writing `quotes`.
    pub fn new(securities: impl Into<PathBuf>, quotes: impl Into<PathBuf>) -> Self {
        Self {
            securities: securities.into(),
            quotes: quotes.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the quote file.
    #[must_use]
    pub fn quotes_path(&self) -> &Path {
        &self.quotes
    }

    /// Every stored quote, in file order.
    ///
    /// # Errors
    /// I/O failures other than a missing file, or an unparsable line.
    pub async fn quotes(&self) -> Result<Vec<QuoteRecord>, FeedlineError> {
        let text = match tokio::fs::read_to_string(&self.quotes).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.quotes, &e)),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    FeedlineError::store(
                        STORE_NAME,
                        format!("{} line {}: {e}", self.quotes.display(), n + 1),
                    )
                })
            })
            .collect()
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> FeedlineError {
    FeedlineError::store(STORE_NAME, format!("{}: {e}", path.display()))
}

#[async_trait]
impl RecordStore for JsonFileStore {
    fn name(&self) -> &'static str {
        STORE_NAME
    }

    async fn list_instruments(&self) -> Result<Option<Vec<SecurityRecord>>, FeedlineError> {
        let text = match tokio::fs::read_to_string(&self.securities).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FeedlineError::not_found(format!(
                    "securities file {}",
                    self.securities.display()
                )));
            }
            Err(e) => return Err(io_error(&self.securities, &e)),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let records = serde_json::from_str(&text).map_err(|e| {
            FeedlineError::store(STORE_NAME, format!("{}: {e}", self.securities.display()))
        })?;
        Ok(Some(records))
    }

    async fn upsert_quote(&self, quote: &QuoteRecord) -> Result<(), FeedlineError> {
        let _guard = self.write_lock.lock().await;
        let mut quotes = self.quotes().await?;
        match quotes
            .iter_mut()
            .find(|q| q.symbol == quote.symbol && q.date == quote.date)
        {
            Some(existing) => existing.clone_from(quote),
            None => quotes.push(quote.clone()),
        }

        let mut out = String::new();
        for q in &quotes {
            let line = serde_json::to_string(q)
                .map_err(|e| FeedlineError::store(STORE_NAME, e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        let tmp = self.quotes.with_extension("tmp");
        tokio::fs::write(&tmp, out)
            .await
            .map_err(|e| io_error(&tmp, &e))?;
        tokio::fs::rename(&tmp, &self.quotes)
            .await
            .map_err(|e| io_error(&self.quotes, &e))
    }
}
