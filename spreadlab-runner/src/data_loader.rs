//! Pair loading for the runner.
//!
//! Fetches base bars for both assets from a provider, resamples them to the
//! configured compression, and aligns them onto one step axis:
//! 1. provider fetch (CSV store or synthetic)
//! 2. resample to N-minute bars
//! 3. align (inner join, or A's clock in legacy mode)
//!
//! A BLAKE3 hash over the aligned bars identifies the dataset in artifacts.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use spreadlab_core::data::{
    align_pair, resample, AlignError, AlignMode, AlignedPair, CsvStore, DataError, DataSource,
    PriceProvider, SymbolMap, SyntheticProvider,
};
use spreadlab_core::domain::Bar;
use spreadlab_core::params;

use crate::config::BacktestConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] params::ConfigError),

    #[error("alignment failed: {0}")]
    Align(#[from] AlignError),
}

/// Options controlling how a pair is loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Minutes per strategy bar.
    pub compression: u32,
    pub align: AlignMode,
}

/// Aligned pair plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub pair: AlignedPair,
    pub source: DataSource,
    /// Dataset hash for fingerprinting (BLAKE3 over all aligned bars).
    pub dataset_hash: String,
    /// Base bars fetched per asset, before resampling.
    pub base_bars: [usize; 2],
}

impl LoadedPair {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Pick the provider named by the config's `[data]` section.
pub fn build_provider(config: &BacktestConfig) -> Result<Box<dyn PriceProvider>, DataError> {
    if config.data.synthetic {
        return Ok(Box::new(SyntheticProvider::new()));
    }
    let mut symbols = SymbolMap::default_crypto();
    if let Some(path) = &config.data.symbols {
        symbols.merge(SymbolMap::from_file(path)?);
    }
    Ok(Box::new(CsvStore::new(&config.data.data_dir, symbols)))
}

fn load_leg(
    provider: &dyn PriceProvider,
    symbol: &str,
    opts: &LoadOptions,
) -> Result<(Vec<Bar>, usize), LoadError> {
    let raw = provider.fetch(symbol, opts.start, opts.end)?;
    let base = raw.len();
    let bars = resample(&raw, opts.compression)?
        .iter()
        .map(|r| r.to_bar(symbol))
        .collect();
    Ok((bars, base))
}

/// Load, resample and align a pair.
pub fn load_pair(
    provider: &dyn PriceProvider,
    c0: &str,
    c1: &str,
    opts: &LoadOptions,
) -> Result<LoadedPair, LoadError> {
    let (bars_a, base_a) = load_leg(provider, c0, opts)?;
    let (bars_b, base_b) = load_leg(provider, c1, opts)?;
    let pair = align_pair(&bars_a, &bars_b, opts.align)?;

    info!(
        provider = provider.name(),
        c0,
        c1,
        base_a,
        base_b,
        steps = pair.len(),
        compression = opts.compression,
        "pair loaded"
    );

    let dataset_hash = compute_dataset_hash(&pair);
    Ok(LoadedPair {
        pair,
        source: provider.source(),
        dataset_hash,
        base_bars: [base_a, base_b],
    })
}

/// Compute a deterministic BLAKE3 hash over the aligned bars.
fn compute_dataset_hash(pair: &AlignedPair) -> String {
    let mut hasher = blake3::Hasher::new();
    for side in [pair.a(), pair.b()] {
        for bar in side {
            hasher.update(bar.symbol.as_bytes());
            hasher.update(&bar.timestamp.timestamp().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(compression: u32) -> LoadOptions {
        LoadOptions {
            start: NaiveDate::from_ymd_opt(2018, 7, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2018, 7, 3).unwrap(),
            compression,
            align: AlignMode::Current,
        }
    }

    #[test]
    fn synthetic_pair_loads_hourly() {
        let provider = SyntheticProvider::new();
        let loaded = load_pair(&provider, "BTC", "XMR", &opts(60)).unwrap();
        // two full days plus the closing midnight bar
        assert_eq!(loaded.pair.len(), 49);
        assert_eq!(loaded.base_bars, [2881, 2881]);
        assert!(loaded.is_synthetic());
    }

    #[test]
    fn dataset_hash_is_deterministic() {
        let provider = SyntheticProvider::new();
        let a = load_pair(&provider, "BTC", "XMR", &opts(60)).unwrap();
        let b = load_pair(&provider, "BTC", "XMR", &opts(60)).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);

        let c = load_pair(&provider, "BTC", "XMR", &opts(30)).unwrap();
        assert_ne!(a.dataset_hash, c.dataset_hash);
    }

    #[test]
    fn missing_store_file_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path(), SymbolMap::default_crypto());
        assert!(matches!(
            load_pair(&store, "BTC", "XMR", &opts(60)),
            Err(LoadError::Data(DataError::Io { .. }))
        ));
    }

    #[test]
    fn zero_compression_is_config_error() {
        let provider = SyntheticProvider::new();
        assert!(matches!(
            load_pair(&provider, "BTC", "XMR", &opts(0)),
            Err(LoadError::Config(params::ConfigError::InvalidCompression(0)))
        ));
    }

    #[test]
    fn build_provider_follows_config() {
        let mut config = BacktestConfig::default();
        config.data.synthetic = true;
        assert_eq!(build_provider(&config).unwrap().source(), DataSource::Synthetic);
        config.data.synthetic = false;
        assert_eq!(build_provider(&config).unwrap().source(), DataSource::CsvStore);
    }
}
