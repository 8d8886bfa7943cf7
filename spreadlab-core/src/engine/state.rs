//! Engine configuration and run result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::broker::BrokerConfig;
use crate::domain::{Fill, Order};
use crate::signal::{PositionState, Transition};

/// How z-scores are produced during the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    /// Whole series up front.
    #[default]
    Vectorized,
    /// One step at a time from the prefix `..=t`.
    Step,
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub broker: BrokerConfig,
    pub eval_mode: EvalMode,
    /// Flatten both legs at the final close.
    pub liquidate_at_end: bool,
    /// Log transitions at info level instead of debug.
    pub log_transitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            eval_mode: EvalMode::Vectorized,
            liquidate_at_end: false,
            log_transitions: false,
        }
    }
}

/// One row of the per-step artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub close_a: f64,
    pub close_b: f64,
    pub spread: Option<f64>,
    pub zscore: Option<f64>,
    pub state: PositionState,
    pub pending: bool,
    pub cash: f64,
    pub portfolio_value: f64,
}

/// A transition together with where it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub transition: Transition,
}

/// Result of a completed backtest run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub model_name: String,
    pub warmup: usize,
    pub records: Vec<StepRecord>,
    pub transitions: Vec<TransitionRecord>,
    pub orders: Vec<Order>,
    pub fills: Vec<Fill>,
    pub final_state: PositionState,
    pub start_value: f64,
    pub end_value: f64,
    pub total_commission: f64,
    /// Portfolio value per step.
    pub equity_curve: Vec<f64>,
    /// Analyzer results keyed by analyzer name.
    pub analyzers: BTreeMap<String, Option<f64>>,
}

impl RunResult {
    pub fn filled_order_count(&self) -> usize {
        self.orders.iter().filter(|o| o.fill_price.is_some()).count()
    }

    pub fn analyzer(&self, name: &str) -> Option<f64> {
        self.analyzers.get(name).copied().flatten()
    }
}
