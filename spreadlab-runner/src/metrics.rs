//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: value series in, scalar out. Markets are
//! assumed to trade 24/7, so a year has `365 * 24 * 60 / compression` steps.
//!
//! `SharpeAnalyzer` wraps `sharpe_ratio` as an engine analyzer so the ratio is
//! produced by the broker alongside the run.

use serde::{Deserialize, Serialize};

use spreadlab_core::domain::OrderStatus;
use spreadlab_core::engine::{Analyzer, RunResult};

/// Standard deviations below this are treated as zero.
const STD_EPSILON: f64 = 1e-15;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub start_value: f64,
    pub end_value: f64,
    pub total_return: f64,
    /// Annualized; `None` when undefined (flat equity, too few steps).
    pub sharpe: Option<f64>,
    pub max_drawdown: f64,
    pub steps: usize,
    pub transitions: usize,
    pub orders_filled: usize,
    pub orders_rejected: usize,
    pub total_commission: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a finished run.
    ///
    /// The Sharpe ratio is taken from the run's `sharpe` analyzer when one was
    /// registered, otherwise computed from the equity curve.
    pub fn compute(result: &RunResult, risk_free: f64, compression: u32) -> Self {
        let mut curve = Vec::with_capacity(result.equity_curve.len() + 1);
        curve.push(result.start_value);
        curve.extend_from_slice(&result.equity_curve);

        let sharpe = if result.analyzers.contains_key(SharpeAnalyzer::NAME) {
            result.analyzer(SharpeAnalyzer::NAME)
        } else {
            sharpe_ratio(&curve, risk_free, periods_per_year(compression))
        };

        Self {
            start_value: result.start_value,
            end_value: result.end_value,
            total_return: total_return(&curve),
            sharpe,
            max_drawdown: max_drawdown(&curve),
            steps: result.records.len(),
            transitions: result.transitions.len(),
            orders_filled: result.filled_order_count(),
            orders_rejected: result
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Rejected)
                .count(),
            total_commission: result.total_commission,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Steps per year for a bar size in minutes, 24/7 calendar.
pub fn periods_per_year(compression: u32) -> f64 {
    365.0 * 24.0 * 60.0 / f64::from(compression.max(1))
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&initial), Some(&last)) if values.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Per-step simple returns. Steps from a non-positive value are skipped.
pub fn step_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Annualized Sharpe ratio from per-step returns.
///
/// Sharpe = mean(r - rf_step) / std(r - rf_step) * sqrt(periods_per_year),
/// with `rf_step = risk_free / periods_per_year` and the sample standard
/// deviation. `None` with fewer than 2 returns or zero dispersion.
pub fn sharpe_ratio(values: &[f64], risk_free: f64, periods_per_year: f64) -> Option<f64> {
    let returns = step_returns(values);
    if returns.len() < 2 || periods_per_year <= 0.0 {
        return None;
    }
    let rf_step = risk_free / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - rf_step).collect();
    let mean = mean_f64(&excess);
    let std = sample_std(&excess, mean);
    if std < STD_EPSILON {
        return None;
    }
    let sharpe = mean / std * periods_per_year.sqrt();
    sharpe.is_finite().then_some(sharpe)
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the series never falls below a previous peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd
}

fn mean_f64(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn sample_std(xs: &[f64], mean: f64) -> f64 {
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

// ─── Analyzer ───────────────────────────────────────────────────────

/// Sharpe ratio as a broker analyzer.
///
/// The series starts at the initial cash, so the first step's return is
/// measured against the starting value.
#[derive(Debug, Clone)]
pub struct SharpeAnalyzer {
    risk_free: f64,
    periods_per_year: f64,
    values: Vec<f64>,
    result: Option<f64>,
}

impl SharpeAnalyzer {
    pub const NAME: &'static str = "sharpe";

    pub fn new(initial_value: f64, risk_free: f64, compression: u32) -> Self {
        Self {
            risk_free,
            periods_per_year: periods_per_year(compression),
            values: vec![initial_value],
            result: None,
        }
    }
}

impl Analyzer for SharpeAnalyzer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_value(&mut self, _step: usize, value: f64) {
        self.values.push(value);
    }

    fn finish(&mut self) {
        self.result = sharpe_ratio(&self.values, self.risk_free, self.periods_per_year);
    }

    fn value(&self) -> Option<f64> {
        self.result
    }
}
