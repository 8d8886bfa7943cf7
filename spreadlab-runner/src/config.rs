//! Serializable backtest configuration.
//!
//! A config is a TOML file with five sections. Every key has a default, so
//! an empty file is a valid config:
//!
//! ```toml
//! [pair]
//! c0 = "BTC"
//! c1 = "XMR"
//! fromdate = "2018-07-01"
//! todate = "2018-09-01"
//! compression = 60
//! oldsync = false
//!
//! [strategy]
//! ols = 3
//! spread_period = "7d"
//! threshold = 2.0
//! order_pct = 0.5
//!
//! [broker]
//! cash = 1000.0
//! commission = 0.002
//! fill_delay = 1
//!
//! [run]
//! risk_free = 0.01
//! filename = "tmp"
//!
//! [data]
//! data_dir = "data"
//! ```
//!
//! CLI flags are applied on top of the parsed file; `resolve()` then turns the
//! flat values into validated core types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use spreadlab_core::data::AlignMode;
use spreadlab_core::engine::{BrokerConfig, EngineConfig, EvalMode};
use spreadlab_core::params::{self, SpreadMethod, StrategyParams};
use spreadlab_core::period::window_from_period;
use spreadlab_core::signal::PositionState;

/// Errors reading or resolving a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] params::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairSection {
    /// Asset A.
    pub c0: String,
    /// Asset B.
    pub c1: String,
    pub fromdate: String,
    pub todate: String,
    /// Bar size in minutes.
    pub compression: u32,
    /// Master-clock alignment on A instead of an inner join.
    pub oldsync: bool,
}

impl Default for PairSection {
    fn default() -> Self {
        Self {
            c0: "BTC".into(),
            c1: "XMR".into(),
            fromdate: "2018-07-01".into(),
            todate: "2018-09-01".into(),
            compression: 60,
            oldsync: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    /// 3 = ratio, 2 = OLS regression.
    pub ols: u8,
    pub spread_period: String,
    pub threshold: f64,
    /// Explicit lower threshold; `-threshold` when absent.
    pub lower: Option<f64>,
    pub order_pct: f64,
    pub initial_state: PositionState,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            ols: 3,
            spread_period: "7d".into(),
            threshold: 2.0,
            lower: None,
            order_pct: 0.5,
            initial_state: PositionState::Flat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSection {
    pub cash: f64,
    pub commission: f64,
    pub fill_delay: usize,
}

impl Default for BrokerSection {
    fn default() -> Self {
        let broker = BrokerConfig::default();
        Self {
            cash: broker.initial_cash,
            commission: broker.commission,
            fill_delay: broker.fill_delay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Step-by-step evaluation instead of vectorized.
    pub runnext: bool,
    pub liquidate: bool,
    /// Annual risk-free rate for the Sharpe ratio.
    pub risk_free: f64,
    /// Artifact base name.
    pub filename: String,
    pub output_dir: PathBuf,
    /// Skip the per-step CSV artifact.
    pub noplot: bool,
    /// Log every transition at info level.
    pub printout: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            runnext: false,
            liquidate: false,
            risk_free: 0.01,
            filename: "tmp".into(),
            output_dir: PathBuf::from("results"),
            noplot: false,
            printout: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// CSV store root.
    pub data_dir: PathBuf,
    /// TOML symbol map merged over the built-in one.
    pub symbols: Option<PathBuf>,
    pub synthetic: bool,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            symbols: None,
            synthetic: false,
        }
    }
}

/// Full configuration for one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub pair: PairSection,
    pub strategy: StrategySection,
    pub broker: BrokerSection,
    pub run: RunSection,
    pub data: DataSection,
}

/// Validated, typed view of a config.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub c0: String,
    pub c1: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub compression: u32,
    pub align: AlignMode,
    pub params: StrategyParams,
    pub engine: EngineConfig,
    pub risk_free: f64,
}

fn parse_date(s: &str) -> Result<NaiveDate, params::ConfigError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| params::ConfigError::InvalidDateRange(format!("'{s}': {e}")))
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> String {
        // Every field is a plain scalar, string, or path; serialization cannot fail.
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Deterministic BLAKE3 fingerprint of the full config.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.to_toml().as_bytes()).to_hex().to_string()
    }

    /// Z-score window in bars for the configured period and compression.
    pub fn window(&self) -> Result<usize, params::ConfigError> {
        window_from_period(&self.strategy.spread_period, self.pair.compression)
    }

    pub fn strategy_params(&self) -> Result<StrategyParams, params::ConfigError> {
        let method = SpreadMethod::from_selector(self.strategy.ols)?;
        let upper = self.strategy.threshold;
        let lower = self.strategy.lower.unwrap_or(-upper);
        Ok(StrategyParams::new(method, self.window()?, upper, lower, self.strategy.order_pct)?
            .with_initial_state(self.strategy.initial_state))
    }

    pub fn engine_config(&self) -> Result<EngineConfig, params::ConfigError> {
        let broker = BrokerConfig {
            initial_cash: self.broker.cash,
            commission: self.broker.commission,
            fill_delay: self.broker.fill_delay,
        };
        broker.validate()?;
        Ok(EngineConfig {
            broker,
            eval_mode: if self.run.runnext {
                EvalMode::Step
            } else {
                EvalMode::Vectorized
            },
            liquidate_at_end: self.run.liquidate,
            log_transitions: self.run.printout,
        })
    }

    /// Validate everything and produce typed values. Fails before any data
    /// is touched.
    pub fn resolve(&self) -> Result<ResolvedConfig, params::ConfigError> {
        let start = parse_date(&self.pair.fromdate)?;
        let end = parse_date(&self.pair.todate)?;
        if end < start {
            return Err(params::ConfigError::InvalidDateRange(format!(
                "todate {end} is before fromdate {start}"
            )));
        }
        if !self.run.risk_free.is_finite() {
            return Err(params::ConfigError::InvalidBroker(format!(
                "risk-free rate must be finite, got {}",
                self.run.risk_free
            )));
        }
        Ok(ResolvedConfig {
            c0: self.pair.c0.clone(),
            c1: self.pair.c1.clone(),
            start,
            end,
            compression: self.pair.compression,
            align: if self.pair.oldsync {
                AlignMode::Legacy
            } else {
                AlignMode::Current
            },
            params: self.strategy_params()?,
            engine: self.engine_config()?,
            risk_free: self.run.risk_free,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BacktestConfig::from_toml("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.pair.c0, "BTC");
        assert_eq!(config.pair.c1, "XMR");
        assert_eq!(config.window().unwrap(), 168);
    }

    #[test]
    fn resolve_defaults() {
        let resolved = BacktestConfig::default().resolve().unwrap();
        assert_eq!(resolved.params.method, SpreadMethod::Ratio);
        assert_eq!(resolved.params.window, 168);
        assert_eq!(resolved.params.upper_threshold, 2.0);
        assert_eq!(resolved.params.lower_threshold, -2.0);
        assert_eq!(resolved.engine.broker.initial_cash, 1000.0);
        assert_eq!(resolved.engine.eval_mode, EvalMode::Vectorized);
        assert_eq!(resolved.align, AlignMode::Current);
        assert_eq!(resolved.start, NaiveDate::from_ymd_opt(2018, 7, 1).unwrap());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = BacktestConfig::from_toml(
            "[strategy]\nols = 2\nlower = -1.5\n\n[run]\nrunnext = true\n",
        )
        .unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.params.method, SpreadMethod::Ols);
        assert_eq!(resolved.params.lower_threshold, -1.5);
        assert_eq!(resolved.params.upper_threshold, 2.0);
        assert_eq!(resolved.engine.eval_mode, EvalMode::Step);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let mut config = BacktestConfig::default();
        config.strategy.ols = 7;
        assert_eq!(
            config.resolve().unwrap_err(),
            params::ConfigError::UnknownMethod(7)
        );
    }

    #[test]
    fn bad_period_and_dates_are_rejected() {
        let mut config = BacktestConfig::default();
        config.strategy.spread_period = "5x".into();
        assert!(matches!(
            config.resolve(),
            Err(params::ConfigError::InvalidPeriod(_))
        ));

        let mut config = BacktestConfig::default();
        config.pair.todate = "2018-06-01".into();
        assert!(matches!(
            config.resolve(),
            Err(params::ConfigError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = BacktestConfig::default();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.strategy.threshold = 2.5;
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn toml_round_trip() {
        let mut config = BacktestConfig::default();
        config.strategy.lower = Some(-1.0);
        config.data.symbols = Some(PathBuf::from("symbols.toml"));
        let parsed = BacktestConfig::from_toml(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn mistyped_values_are_rejected() {
        assert!(BacktestConfig::from_toml("[strategy]\nthreshold = \"high\"\n").is_err());
    }
}
