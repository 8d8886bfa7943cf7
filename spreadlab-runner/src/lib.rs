//! SpreadLab Runner: backtest orchestration, metrics, sweeps and artifacts.
//!
//! This crate builds on `spreadlab-core` to provide:
//! - TOML configuration with CLI-friendly flat sections
//! - Pair loading from the CSV store or the synthetic provider
//! - Single-backtest runner with the Sharpe analyzer attached
//! - Parallel parameter sweeps
//! - CSV/JSON artifacts and the stdout report

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, ResolvedConfig};
pub use data_loader::{build_provider, load_pair, LoadError, LoadOptions, LoadedPair};
pub use export::{save_artifacts, ArtifactPaths, ExportError};
pub use metrics::{PerformanceMetrics, SharpeAnalyzer};
pub use report::{format_report, format_sweep_table};
pub use runner::{load_options, run_backtest_from_data, run_single_backtest, BacktestResult, RunError};
pub use sweep::{run_sweep, ParamGrid, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn loaded_pair_is_shareable_across_sweep_workers() {
        assert_send::<LoadedPair>();
        assert_sync::<LoadedPair>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }
}
