//! Deterministic synthetic 1-minute candles.
//!
//! Every symbol shares one market factor (a random walk in log price) plus
//! its own mean-reverting idiosyncratic component, so any two symbols form a
//! plausibly cointegrated pair. Seeds derive from BLAKE3 hashes of the
//! symbol name, so the same symbol and range always produce the same bars.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{range_bounds, DataError, DataSource, PriceProvider, RawBar};

const MARKET_KEY: &str = "spreadlab-market";

/// Synthetic provider parameters.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    /// Per-minute standard scale of the market factor step.
    pub market_vol: f64,
    /// Per-minute scale of the idiosyncratic shock.
    pub idio_vol: f64,
    /// AR(1) pull of the idiosyncratic component toward zero, per minute.
    pub reversion: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            market_vol: 0.0008,
            idio_vol: 0.0006,
            reversion: 0.002,
        }
    }
}

fn seeded_rng(key: &str) -> StdRng {
    let seed: [u8; 32] = *blake3::hash(key.as_bytes()).as_bytes();
    StdRng::from_seed(seed)
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate bars for `symbol` at one-minute spacing over the inclusive
    /// range `start 00:00 ..= end 00:00` UTC.
    pub fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let (lo, hi) = range_bounds(start, end);
        if hi < lo {
            return Vec::new();
        }

        let mut market_rng = seeded_rng(MARKET_KEY);
        let mut rng = seeded_rng(symbol);

        // Symbol-specific level and market sensitivity
        let base: f64 = rng.gen_range(1.0..500.0);
        let beta: f64 = rng.gen_range(0.6..1.4);

        let mut market = 0.0_f64;
        let mut idio = 0.0_f64;
        let mut prev_close = base;
        let mut bars = Vec::new();
        let mut ts = lo;

        while ts <= hi {
            market += market_rng.gen_range(-1.0..1.0) * self.market_vol;
            idio = idio * (1.0 - self.reversion) + rng.gen_range(-1.0..1.0) * self.idio_vol;

            let close = base * (beta * market + idio).exp();
            let open = prev_close;
            let wick: f64 = rng.gen_range(0.0..0.0005);
            let high = open.max(close) * (1.0 + wick);
            let low = open.min(close) * (1.0 - wick);
            let volume: f64 = rng.gen_range(0.1..50.0);

            bars.push(RawBar {
                timestamp: ts,
                open,
                high,
                low,
                close,
                volume,
            });

            prev_close = close;
            ts += Duration::minutes(1);
        }

        bars
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let bars = self.generate(symbol, start, end);
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(bars)
    }
}
