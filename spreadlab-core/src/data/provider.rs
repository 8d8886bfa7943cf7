//! Price provider trait and structured error types.
//!
//! The `PriceProvider` trait abstracts over data sources (CSV candle store,
//! synthetic series) so the runner can swap implementations and tests can
//! inject fixed data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::Bar;

/// Raw OHLCV bar from a provider, at the provider's base resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawBar {
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    pub fn to_bar(&self, symbol: &str) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            timestamp: self.timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found in symbol map: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("no data for '{symbol}' between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("symbol map error: {0}")]
    SymbolMap(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CsvStore,
    Synthetic,
    InMemory,
}

/// Trait for price providers.
///
/// Implementations return bars for `start 00:00 UTC ..= end 00:00 UTC`,
/// ordered by timestamp ascending with no duplicate timestamps.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch base-resolution bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<RawBar>, DataError>;
}

/// Inclusive timestamp bounds for a date range, both at midnight UTC.
pub fn range_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = |d: NaiveDate| d.and_time(chrono::NaiveTime::MIN).and_utc();
    (midnight(start), midnight(end))
}

/// Canonicalize provider rows: drop non-finite rows, sort ascending, reject
/// duplicate timestamps, and keep only rows inside the inclusive range.
pub fn canonicalize(
    symbol: &str,
    mut bars: Vec<RawBar>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RawBar>, DataError> {
    let before = bars.len();
    bars.retain(RawBar::is_finite);
    let dropped = before - bars.len();
    if dropped > 0 {
        warn!(symbol, dropped, "dropped bars with non-finite prices");
    }

    let (lo, hi) = range_bounds(start, end);
    bars.retain(|b| b.timestamp >= lo && b.timestamp <= hi);
    bars.sort_by_key(|b| b.timestamp);

    if let Some(w) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(DataError::Validation(format!(
            "duplicate timestamp {} for {symbol}",
            w[0].timestamp
        )));
    }

    if bars.is_empty() {
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }
    Ok(bars)
}

/// Provider over bars already held in memory. Used by tests and by callers
/// that assemble series themselves.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProvider {
    series: std::collections::HashMap<String, Vec<RawBar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<RawBar>) {
        self.series.insert(symbol.into(), bars);
    }
}

impl PriceProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn source(&self) -> DataSource {
        DataSource::InMemory
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let bars = self
            .series
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;
        canonicalize(symbol, bars, start, end)
    }
}
