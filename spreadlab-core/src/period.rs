//! Period strings ("7d", "24h") and their conversion into bar counts.
//!
//! Grammar: `<integer><unit>` with unit `d` (days) or `h` (hours). The bar
//! count is the number of whole compressed bars that fit in the period:
//! `floor(n * minutes_in(unit) / compression)`. Total minutes are floored
//! once, so a compression that does not divide 60 (e.g. 45) gives 224 bars for
//! "7d", not the 168 of rounding bars-per-hour down first.

use crate::params::ConfigError;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// A parsed period length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Days(u64),
    Hours(u64),
}

impl Period {
    /// Parse a period string such as `"7d"` or `"3h"`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidPeriod(s.to_string());

        let (digits, ctor): (&str, fn(u64) -> Period) = if let Some(d) = s.strip_suffix('d') {
            (d, Period::Days)
        } else if let Some(h) = s.strip_suffix('h') {
            (h, Period::Hours)
        } else {
            return Err(invalid());
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: u64 = digits.parse().map_err(|_| invalid())?;
        Ok(ctor(n))
    }

    pub fn minutes(self) -> u64 {
        match self {
            Period::Days(n) => n.saturating_mul(MINUTES_PER_DAY),
            Period::Hours(n) => n.saturating_mul(MINUTES_PER_HOUR),
        }
    }

    /// Number of bars of `compression` minutes that fit in this period.
    pub fn bars(self, compression: u32) -> Result<usize, ConfigError> {
        if compression == 0 {
            return Err(ConfigError::InvalidCompression(compression));
        }
        Ok((self.minutes() / u64::from(compression)) as usize)
    }
}

/// Parse a period string and convert it into a z-score window length.
///
/// The window must hold at least two bars.
pub fn window_from_period(period: &str, compression: u32) -> Result<usize, ConfigError> {
    let bars = Period::parse(period)?.bars(compression)?;
    if bars < 2 {
        return Err(ConfigError::InvalidWindow(bars));
    }
    Ok(bars)
}
