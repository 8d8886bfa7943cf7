//! Backtest runner: wires together config, data loading, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: resolves the config, loads the pair, then runs. Used by CLI.
//! - `run_backtest_from_data()`: takes a pre-loaded pair. Used by the sweep.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use spreadlab_core::data::{DataSource, PriceProvider};
use spreadlab_core::domain::Order;
use spreadlab_core::engine::{run_pair_backtest, StepRecord, TransitionRecord};
use spreadlab_core::params;
use spreadlab_core::signal::PositionState;

use crate::config::{BacktestConfig, ConfigError, ResolvedConfig};
use crate::data_loader::{load_pair, LoadError, LoadOptions, LoadedPair};
use crate::export::ExportError;
use crate::metrics::{PerformanceMetrics, SharpeAnalyzer};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] params::ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: BacktestConfig,
    /// BLAKE3 fingerprint of `config`.
    pub config_hash: String,
    pub dataset_hash: String,
    pub source: DataSource,
    pub model: String,
    pub window: usize,
    pub warmup: usize,
    pub metrics: PerformanceMetrics,
    pub final_state: PositionState,
    pub transitions: Vec<TransitionRecord>,
    pub orders: Vec<Order>,
    /// Per-step rows; not persisted in the JSON summary.
    #[serde(skip)]
    pub records: Vec<StepRecord>,
}

impl BacktestResult {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load options for a resolved config.
pub fn load_options(resolved: &ResolvedConfig) -> LoadOptions {
    LoadOptions {
        start: resolved.start,
        end: resolved.end,
        compression: resolved.compression,
        align: resolved.align,
    }
}

/// Run a single backtest from a `BacktestConfig`.
///
/// Configuration is fully validated before the provider is touched.
pub fn run_single_backtest(
    config: &BacktestConfig,
    provider: &dyn PriceProvider,
) -> Result<BacktestResult, RunError> {
    let resolved = config.resolve()?;
    let loaded = load_pair(provider, &resolved.c0, &resolved.c1, &load_options(&resolved))?;
    run_backtest_from_data(config, &resolved, &loaded)
}

/// Run a backtest on a pre-loaded pair. Performs no I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    resolved: &ResolvedConfig,
    loaded: &LoadedPair,
) -> Result<BacktestResult, RunError> {
    let sharpe = SharpeAnalyzer::new(
        resolved.engine.broker.initial_cash,
        resolved.risk_free,
        resolved.compression,
    );
    let run = run_pair_backtest(
        &loaded.pair,
        &resolved.params,
        &resolved.engine,
        vec![Box::new(sharpe)],
    )?;

    let metrics = PerformanceMetrics::compute(&run, resolved.risk_free, resolved.compression);
    info!(
        model = %run.model_name,
        end_value = metrics.end_value,
        sharpe = ?metrics.sharpe,
        "run complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        config_hash: config.fingerprint(),
        dataset_hash: loaded.dataset_hash.clone(),
        source: loaded.source,
        model: run.model_name,
        window: resolved.params.window,
        warmup: run.warmup,
        metrics,
        final_state: run.final_state,
        transitions: run.transitions,
        orders: run.orders,
        records: run.records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spreadlab_core::data::SyntheticProvider;

    fn short_config() -> BacktestConfig {
        let mut config = BacktestConfig::default();
        config.pair.todate = "2018-07-15".into();
        config.strategy.spread_period = "1d".into();
        config
    }

    #[test]
    fn synthetic_run_produces_metrics() {
        let result = run_single_backtest(&short_config(), &SyntheticProvider::new()).unwrap();
        assert_eq!(result.window, 24);
        assert_eq!(result.model, "ratio_24");
        assert_eq!(result.metrics.start_value, 1000.0);
        assert_eq!(result.records.len(), 14 * 24 + 1);
        assert!(result.is_synthetic());
        assert_eq!(result.config_hash, short_config().fingerprint());
    }

    #[test]
    fn config_errors_surface_before_loading() {
        let mut config = short_config();
        config.strategy.ols = 4;
        assert!(matches!(
            run_single_backtest(&config, &SyntheticProvider::new()),
            Err(RunError::Invalid(params::ConfigError::UnknownMethod(4)))
        ));
    }
}
