//! Rolling OLS spread.
//!
//! At every step `s` a least-squares line `A = alpha + beta * B` is fitted over
//! the last `window` pairs ending at `s`. The spread is the residual of the
//! current pair against that line, `A[s] - (beta * B[s] + alpha)`, and the
//! residual series is then normalized over another `window` steps.
//!
//! Lookback: 2 * (window - 1). The first residual needs `window` pairs, and the
//! first z-score needs `window` residuals.
//!
//! Each residual costs one O(window) fit. Walking a series with
//! `SpreadStepper` computes every residual once, so vectorized and step
//! evaluation are both O(N * window).

use super::rolling::{window_range, WindowStats, ZERO_STD_TOLERANCE};
use super::SpreadModel;

/// Fitted regression line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsFit {
    pub alpha: f64,
    pub beta: f64,
}

impl OlsFit {
    /// Least-squares fit of `a` on `b`.
    ///
    /// Returns `None` when the inputs differ in length, hold fewer than two
    /// points, contain a non-finite value, or `b` has no variance.
    pub fn fit(a: &[f64], b: &[f64]) -> Option<Self> {
        if a.len() != b.len() || a.len() < 2 {
            return None;
        }
        if a.iter().chain(b).any(|v| !v.is_finite()) {
            return None;
        }
        let n = a.len() as f64;
        let mean_a = a.iter().sum::<f64>() / n;
        let mean_b = b.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_b = 0.0;
        for (&x, &y) in b.iter().zip(a) {
            let dx = x - mean_b;
            cov += dx * (y - mean_a);
            var_b += dx * dx;
        }

        let floor = ZERO_STD_TOLERANCE * mean_b.abs().max(f64::MIN_POSITIVE);
        if (var_b / n).sqrt() <= floor {
            return None;
        }
        let beta = cov / var_b;
        Some(Self {
            alpha: mean_a - beta * mean_b,
            beta,
        })
    }

    pub fn residual(&self, a: f64, b: f64) -> f64 {
        a - (self.beta * b + self.alpha)
    }
}

#[derive(Debug, Clone)]
pub struct OlsSpread {
    window: usize,
    name: String,
}

impl OlsSpread {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "OLS spread window must be >= 2");
        Self {
            window,
            name: format!("ols_{window}"),
        }
    }

    /// Regression residual at step `s`, using pairs `s-window+1..=s` only.
    fn residual_at(&self, a: &[f64], b: &[f64], s: usize) -> Option<f64> {
        let range = window_range(s, self.window)?;
        if *range.end() >= a.len() || *range.end() >= b.len() {
            return None;
        }
        let fit = OlsFit::fit(&a[range.clone()], &b[range])?;
        let r = fit.residual(a[s], b[s]);
        r.is_finite().then_some(r)
    }

    /// Mean absolute level of `A` over the window ending at `t`.
    ///
    /// Residuals are in price units, so their dispersion is judged against
    /// the price level rather than against their own (near zero) mean.
    fn price_scale(&self, a: &[f64], t: usize) -> f64 {
        match window_range(t, self.window) {
            Some(range) if *range.end() < a.len() => {
                let n = self.window as f64;
                a[range].iter().map(|p| p.abs()).sum::<f64>() / n
            }
            _ => 0.0,
        }
    }
}

impl SpreadModel for OlsSpread {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        self.window
    }

    fn warmup(&self) -> usize {
        2 * (self.window - 1)
    }

    fn spread_at(&self, a: &[f64], b: &[f64], s: usize) -> Option<f64> {
        self.residual_at(a, b, s)
    }

    fn normalize(&self, spreads: &[Option<f64>], a: &[f64], t: usize) -> Option<f64> {
        let current = (*spreads.last()?)?;
        let stats = WindowStats::of(spreads)?;
        stats.zscore(current, self.price_scale(a, t))
    }
}
