//! Ratio spread: `A / B`, normalized over a rolling window.
//!
//! Lookback: window - 1 (first defined z-score at index window-1).

use super::rolling::WindowStats;
use super::{price_ratio, SpreadModel};

#[derive(Debug, Clone)]
pub struct RatioSpread {
    window: usize,
    name: String,
}

impl RatioSpread {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "ratio spread window must be >= 2");
        Self {
            window,
            name: format!("ratio_{window}"),
        }
    }
}

impl SpreadModel for RatioSpread {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        self.window
    }

    fn warmup(&self) -> usize {
        self.window - 1
    }

    fn spread_at(&self, a: &[f64], b: &[f64], s: usize) -> Option<f64> {
        price_ratio(*a.get(s)?, *b.get(s)?)
    }

    fn normalize(&self, spreads: &[Option<f64>], _a: &[f64], _t: usize) -> Option<f64> {
        let current = (*spreads.last()?)?;
        let stats = WindowStats::of(spreads)?;
        stats.zscore(current, stats.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spread::assert_approx;

    #[test]
    fn warmup_is_window_minus_one() {
        let model = RatioSpread::new(5);
        let a = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let b = [1.0; 6];
        let z = model.compute_zscore(&a, &b);
        assert_eq!(z.len(), 6);
        for v in z.iter().take(4) {
            assert!(v.is_none());
        }
        assert!(z[4].is_some());
        assert_eq!(model.warmup(), 4);
    }

    #[test]
    fn linear_ratio_zscore() {
        // Window [10..14]: mean 12, population std sqrt(2)
        let model = RatioSpread::new(5);
        let a = [10.0, 11.0, 12.0, 13.0, 14.0];
        let b = [1.0; 5];
        let z = model.compute_zscore(&a, &b);
        assert_approx(z[4].unwrap(), 2.0 / 2.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn constant_ratio_is_undefined() {
        let model = RatioSpread::new(3);
        let b: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let a: Vec<f64> = b.iter().map(|p| p * 2.5).collect();
        assert!(model.compute_zscore(&a, &b).iter().all(|z| z.is_none()));
    }

    #[test]
    fn zero_price_blanks_every_window_containing_it() {
        let model = RatioSpread::new(3);
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0];
        let b = [1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let z = model.compute_zscore(&a, &b);
        assert!(z[2].is_none());
        assert!(z[3].is_none());
        assert!(z[4].is_none());
        assert!(z[5].is_some());
    }

    #[test]
    fn step_mode_matches_vectorized() {
        let model = RatioSpread::new(4);
        let a: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let b: Vec<f64> = (0..30).map(|i| 50.0 + (i as f64 * 0.3).cos()).collect();
        let vectorized = model.compute_zscore(&a, &b);
        for t in 0..a.len() {
            assert_eq!(model.zscore_at(&a, &b, t), vectorized[t], "step {t}");
        }
    }
}
