//! Local CSV candle store.
//!
//! Layout: `{root}/{exchange}/candles_{QUOTE}_{SYMBOL}.csv`, one row per base
//! bar with header `start,open,high,low,close,volume` where `start` is the
//! bar's opening time in unix seconds.
//!
//! Writes are atomic (write to .tmp, rename into place).

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::{canonicalize, DataError, DataSource, PriceProvider, RawBar};
use super::symbols::SymbolMap;

/// One CSV row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandleRow {
    start: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CandleRow {
    fn into_raw(self) -> Result<RawBar, DataError> {
        let timestamp = DateTime::from_timestamp(self.start, 0).ok_or_else(|| {
            DataError::Validation(format!("timestamp out of range: {}", self.start))
        })?;
        Ok(RawBar {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }

    fn from_raw(bar: &RawBar) -> Self {
        Self {
            start: bar.timestamp.timestamp(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// The CSV store.
pub struct CsvStore {
    root: PathBuf,
    symbols: SymbolMap,
}

impl CsvStore {
    pub fn new(root: impl Into<PathBuf>, symbols: SymbolMap) -> Self {
        Self {
            root: root.into(),
            symbols,
        }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn symbols(&self) -> &SymbolMap {
        &self.symbols
    }

    /// Path of a symbol's candle file.
    pub fn path_for(&self, symbol: &str) -> Result<PathBuf, DataError> {
        let source = self.symbols.resolve(symbol)?;
        Ok(self
            .root
            .join(&source.exchange)
            .join(format!("candles_{}_{symbol}", source.quote))
            .with_extension("csv"))
    }

    /// Read every row of a symbol's file, unfiltered and unsorted.
    pub fn read_all(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        let path = self.path_for(symbol)?;
        if !path.exists() {
            return Err(DataError::Io {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "candle file missing"),
            });
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<CandleRow>() {
            bars.push(row?.into_raw()?);
        }
        debug!(symbol, rows = bars.len(), path = %path.display(), "read candle file");
        Ok(bars)
    }

    /// Write bars for a symbol, replacing any existing file.
    pub fn write(&self, symbol: &str, bars: &[RawBar]) -> Result<PathBuf, DataError> {
        if bars.is_empty() {
            return Err(DataError::Validation(format!("no bars to write for {symbol}")));
        }
        let path = self.path_for(symbol)?;
        let io_err = |path: &Path, source| DataError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for bar in bars {
                writer.serialize(CandleRow::from_raw(bar))?;
            }
            writer.flush().map_err(|e| io_err(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_err(&path, e)
        })?;
        Ok(path)
    }
}

impl PriceProvider for CsvStore {
    fn name(&self) -> &str {
        "csv-store"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvStore
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let bars = self.read_all(symbol)?;
        canonicalize(symbol, bars, start, end)
    }
}
