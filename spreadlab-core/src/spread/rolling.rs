//! Window statistics shared by every spread model.
//!
//! Mean and standard deviation use a two-pass scan over each window, so a
//! constant window yields a spread of (almost exactly) zero.

/// A standard deviation at or below `ZERO_STD_TOLERANCE * scale` counts as zero.
pub const ZERO_STD_TOLERANCE: f64 = 1e-12;

/// Population mean and standard deviation of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl WindowStats {
    /// Compute stats over a fully defined window.
    ///
    /// Returns `None` if the window is empty or any value is undefined or
    /// non-finite.
    pub fn of(values: &[Option<f64>]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for v in values {
            let v = (*v)?;
            if !v.is_finite() {
                return None;
            }
            sum += v;
        }
        let n = values.len() as f64;
        let mean = sum / n;
        let sq: f64 = values
            .iter()
            .flatten()
            .map(|v| (v - mean) * (v - mean))
            .sum();
        Some(Self {
            mean,
            std_dev: (sq / n).sqrt(),
        })
    }

    /// Normalized deviation of `value` from the window mean.
    ///
    /// `scale` is the magnitude the spread is measured against; a standard
    /// deviation that is negligible relative to it yields `None`.
    pub fn zscore(&self, value: f64, scale: f64) -> Option<f64> {
        if !value.is_finite() || !self.std_dev.is_finite() {
            return None;
        }
        let floor = ZERO_STD_TOLERANCE * scale.abs().max(f64::MIN_POSITIVE);
        if self.std_dev <= floor {
            return None;
        }
        Some((value - self.mean) / self.std_dev)
    }
}

/// The inclusive index range of a window of `window` values ending at `t`.
///
/// `None` while there is insufficient history.
pub fn window_range(t: usize, window: usize) -> Option<std::ops::RangeInclusive<usize>> {
    if window == 0 || t + 1 < window {
        return None;
    }
    Some((t + 1 - window)..=t)
}
