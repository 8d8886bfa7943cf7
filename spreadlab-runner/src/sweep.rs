//! Parameter sweep over z-score windows, thresholds and spread methods.
//!
//! The pair is loaded once; every grid point runs against the same immutable
//! `LoadedPair`, in parallel with rayon.

use rayon::prelude::*;
use std::cmp::Ordering;

use crate::config::BacktestConfig;
use crate::data_loader::LoadedPair;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// Cartesian grid of strategy parameters.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    /// Period strings for the z-score window (e.g. "1d", "7d").
    pub spread_periods: Vec<String>,
    /// Upper thresholds; lower is always the negation.
    pub thresholds: Vec<f64>,
    /// Method selectors (3 = ratio, 2 = OLS).
    pub methods: Vec<u8>,
}

impl ParamGrid {
    /// Grid around the default configuration.
    ///
    /// Periods: 1d, 3d, 7d, 14d
    /// Thresholds: 1.5, 2.0, 2.5
    pub fn default_grid() -> Self {
        Self {
            spread_periods: ["1d", "3d", "7d", "14d"].map(String::from).to_vec(),
            thresholds: vec![1.5, 2.0, 2.5],
            methods: vec![3],
        }
    }

    /// Total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.spread_periods.len() * self.thresholds.len() * self.methods.len()
    }

    /// All configurations in the grid, varying only strategy keys.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &method in &self.methods {
            for period in &self.spread_periods {
                for &threshold in &self.thresholds {
                    let mut config = base.clone();
                    config.strategy.ols = method;
                    config.strategy.spread_period = period.clone();
                    config.strategy.threshold = threshold;
                    config.strategy.lower = None;
                    configs.push(config);
                }
            }
        }
        configs
    }
}

/// Run every grid point against the same loaded pair.
///
/// Any invalid grid point (e.g. a period too short for the compression)
/// fails the whole sweep before results are reported.
pub fn run_sweep(
    grid: &ParamGrid,
    base: &BacktestConfig,
    loaded: &LoadedPair,
) -> Result<SweepResults, RunError> {
    let configs = grid.generate_configs(base);
    let results = configs
        .par_iter()
        .map(|config| {
            let resolved = config.resolve()?;
            run_backtest_from_data(config, &resolved, loaded)
        })
        .collect::<Result<Vec<_>, RunError>>()?;
    Ok(SweepResults::new(results))
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        Self { results }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results sorted by Sharpe ratio, descending. Undefined Sharpe sorts last.
    pub fn sorted_by_sharpe(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| match (a.metrics.sharpe, b.metrics.sharpe) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        sorted
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by_sharpe().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_and_configs() {
        let grid = ParamGrid {
            spread_periods: vec!["1d".into(), "2d".into()],
            thresholds: vec![1.5, 2.0, 2.5],
            methods: vec![2, 3],
        };
        assert_eq!(grid.size(), 12);

        let mut base = BacktestConfig::default();
        base.strategy.lower = Some(-9.0);
        let configs = grid.generate_configs(&base);
        assert_eq!(configs.len(), 12);
        assert!(configs.iter().all(|c| c.strategy.lower.is_none()));
        assert_eq!(configs[0].strategy.ols, 2);
        assert_eq!(configs[11].strategy.ols, 3);
        assert_eq!(configs[11].strategy.spread_period, "2d");
        assert_eq!(configs[11].strategy.threshold, 2.5);
    }

    #[test]
    fn default_grid_is_ratio_only() {
        let grid = ParamGrid::default_grid();
        assert_eq!(grid.size(), 12);
        assert_eq!(grid.methods, vec![3]);
    }
}
