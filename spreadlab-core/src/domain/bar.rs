//! Aligned market bar for one leg of the pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for one symbol at the strategy resolution.
///
/// `timestamp` is the start of the bar interval in UTC. In legacy alignment
/// the B leg keeps its own (earlier or equal) timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Open and close are finite and strictly positive, so the bar can be
    /// traded at either price.
    pub fn is_tradable(&self) -> bool {
        [self.open, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }

    /// High/low envelope contains open and close and volume is non-negative.
    pub fn is_consistent(&self) -> bool {
        self.is_tradable()
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.volume >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn xmr_bar() -> Bar {
        Bar {
            symbol: "XMR".into(),
            timestamp: Utc.with_ymd_and_hms(2018, 7, 1, 0, 0, 0).unwrap(),
            open: 131.2,
            high: 132.0,
            low: 130.4,
            close: 131.7,
            volume: 84.0,
        }
    }

    #[test]
    fn well_formed_bar() {
        assert!(xmr_bar().is_tradable());
        assert!(xmr_bar().is_consistent());
    }

    #[test]
    fn zero_or_nan_price_is_not_tradable() {
        let mut bar = xmr_bar();
        bar.open = 0.0;
        assert!(!bar.is_tradable());

        let mut bar = xmr_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_tradable());
        assert!(!bar.is_consistent());
    }

    #[test]
    fn close_outside_envelope() {
        let mut bar = xmr_bar();
        bar.close = 133.0;
        assert!(bar.is_tradable());
        assert!(!bar.is_consistent());
    }
}
