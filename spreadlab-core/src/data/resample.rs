//! Aggregation of base (1-minute) bars into N-minute bars.
//!
//! Buckets are aligned to the unix epoch: a bar with opening time `ts` lands
//! in bucket `floor(ts / (compression * 60s))`, and the output bar is labeled
//! with the bucket's start time. Empty buckets produce no bar.
//!
//! Start labels sit one compression earlier than end-of-bucket labelling; the
//! bar's contents are identical either way.

use chrono::DateTime;

use super::provider::RawBar;
use crate::params::ConfigError;

/// Bucket start (unix seconds) for a timestamp.
fn bucket_start(ts: i64, span_secs: i64) -> i64 {
    ts.div_euclid(span_secs) * span_secs
}

/// Resample ascending base bars into `compression`-minute bars.
///
/// open = first open, high = max high, low = min low, close = last close,
/// volume = sum. A compression of 1 returns the input unchanged.
pub fn resample(bars: &[RawBar], compression: u32) -> Result<Vec<RawBar>, ConfigError> {
    if compression == 0 {
        return Err(ConfigError::InvalidCompression(compression));
    }
    if compression == 1 {
        return Ok(bars.to_vec());
    }

    let span = i64::from(compression) * 60;
    let mut out: Vec<RawBar> = Vec::new();
    let mut current: Option<(i64, RawBar)> = None;

    for bar in bars {
        let key = bucket_start(bar.timestamp.timestamp(), span);
        match current.as_mut() {
            Some((k, agg)) if *k == key => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                if let Some((_, done)) = current.take() {
                    out.push(done);
                }
                let Some(label) = DateTime::from_timestamp(key, 0) else {
                    continue;
                };
                current = Some((
                    key,
                    RawBar {
                        timestamp: label,
                        ..bar.clone()
                    },
                ));
            }
        }
    }
    if let Some((_, done)) = current {
        out.push(done);
    }
    Ok(out)
}
