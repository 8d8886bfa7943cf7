//! Spread/z-score engine.
//!
//! A `SpreadModel` turns two aligned close-price series into a z-score series.
//! Two interchangeable implementations exist:
//! - `RatioSpread`: spread = A / B
//! - `OlsSpread`: spread = residual of a rolling regression of A on B
//!
//! Both normalize their spread with a rolling population mean and standard
//! deviation over the same window. Undefined values are `None`: warm-up,
//! zero or non-finite prices, and windows with zero dispersion. A `None`
//! z-score never triggers a trade.

pub mod ols;
pub mod ratio;
pub mod rolling;

pub use ols::{OlsFit, OlsSpread};
pub use ratio::RatioSpread;
pub use rolling::WindowStats;

use rolling::window_range;

use crate::params::{ConfigError, SpreadMethod};

/// Trait for spread models.
///
/// A model supplies two primitives: the raw spread at one step, and the
/// normalization of a window of spreads ending at a step. The vectorized,
/// single-step and incremental evaluators are all built from them, so they
/// agree bit for bit.
///
/// # Look-ahead contamination guard
/// `spread_at(a, b, s)` and `normalize(.., a, t)` may only read prices at
/// indices `<= s` (resp. `<= t`).
pub trait SpreadModel: Send + Sync {
    /// Human-readable name (e.g., "ratio_168", "ols_24").
    fn name(&self) -> &str;

    /// Rolling window length in steps.
    fn window(&self) -> usize;

    /// Index of the first step that can carry a defined z-score.
    fn warmup(&self) -> usize;

    /// Raw spread at step `s`, reading only indices `<= s`.
    fn spread_at(&self, a: &[f64], b: &[f64], s: usize) -> Option<f64>;

    /// Z-score of the last value of `spreads`, a full window ending at `t`.
    fn normalize(&self, spreads: &[Option<f64>], a: &[f64], t: usize) -> Option<f64>;

    /// Raw spread series (before normalization), same length as the inputs.
    fn spread(&self, a: &[f64], b: &[f64]) -> Vec<Option<f64>> {
        let n = a.len().min(b.len());
        (0..n).map(|s| self.spread_at(a, b, s)).collect()
    }

    /// Vectorized z-scores for the whole series.
    fn compute_zscore(&self, a: &[f64], b: &[f64]) -> Vec<Option<f64>> {
        let spreads = self.spread(a, b);
        (0..spreads.len())
            .map(|t| {
                let range = window_range(t, self.window())?;
                self.normalize(&spreads[range], a, t)
            })
            .collect()
    }

    /// Z-score of a single step without any cached state, reading only
    /// indices `<= t`. Recomputes the whole window of spreads; use
    /// `SpreadStepper` to walk a series.
    fn zscore_at(&self, a: &[f64], b: &[f64], t: usize) -> Option<f64> {
        if t >= a.len().min(b.len()) {
            return None;
        }
        let range = window_range(t, self.window())?;
        let spreads: Vec<Option<f64>> = range.map(|s| self.spread_at(a, b, s)).collect();
        self.normalize(&spreads, a, t)
    }
}

/// Incremental step-mode evaluator.
///
/// Each call to `next` sees one more step of the price prefix. Spreads of
/// earlier steps are cached; they only ever read indices up to their own
/// step, so the cache holds nothing from the future.
pub struct SpreadStepper<'m> {
    model: &'m dyn SpreadModel,
    spreads: Vec<Option<f64>>,
}

impl<'m> SpreadStepper<'m> {
    pub fn new(model: &'m dyn SpreadModel) -> Self {
        Self {
            model,
            spreads: Vec::new(),
        }
    }

    /// Number of steps consumed so far.
    pub fn steps(&self) -> usize {
        self.spreads.len()
    }

    /// Spread of the most recent step.
    pub fn last_spread(&self) -> Option<f64> {
        self.spreads.last().copied().flatten()
    }

    /// Advance one step. `a` and `b` are the price prefixes up to and
    /// including the new step.
    pub fn next(&mut self, a: &[f64], b: &[f64]) -> Option<f64> {
        let t = self.spreads.len();
        self.spreads.push(if t < a.len().min(b.len()) {
            self.model.spread_at(a, b, t)
        } else {
            None
        });
        let range = window_range(t, self.model.window())?;
        self.model.normalize(&self.spreads[range], a, t)
    }
}

/// Build the model selected by configuration.
pub fn build_model(method: SpreadMethod, window: usize) -> Result<Box<dyn SpreadModel>, ConfigError> {
    if window < 2 {
        return Err(ConfigError::InvalidWindow(window));
    }
    Ok(match method {
        SpreadMethod::Ratio => Box::new(RatioSpread::new(window)),
        SpreadMethod::Ols => Box::new(OlsSpread::new(window)),
    })
}

/// `a / b`, or `None` when either price is unusable or `b` is zero.
pub fn price_ratio(a: f64, b: f64) -> Option<f64> {
    if !a.is_finite() || !b.is_finite() || b == 0.0 {
        return None;
    }
    let r = a / b;
    r.is_finite().then_some(r)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
