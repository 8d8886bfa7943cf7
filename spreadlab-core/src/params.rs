//! Immutable strategy parameters and configuration errors.
//!
//! Everything here is validated once, before the first step is processed.
//! A run never starts with a parameter set that would fail later.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signal::PositionState;

/// Fatal configuration errors, raised before any step is evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown spread method selector {0} (expected 2 = OLS regression or 3 = ratio)")]
    UnknownMethod(u8),

    #[error("can't parse period: {0}")]
    InvalidPeriod(String),

    #[error("degenerate thresholds: upper={upper}, lower={lower} (need upper > 0 > lower)")]
    DegenerateThresholds { upper: f64, lower: f64 },

    #[error("z-score window must be >= 2, got {0}")]
    InvalidWindow(usize),

    #[error("order percentage must be in (0, 1], got {0}")]
    InvalidOrderPct(f64),

    #[error("compression must be >= 1 minute, got {0}")]
    InvalidCompression(u32),

    #[error("invalid broker setting: {0}")]
    InvalidBroker(String),

    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
}

/// Which statistical method turns two price series into a spread.
///
/// The numeric selectors follow the command-line convention: `2` picks the
/// rolling OLS regression, `3` picks the plain price ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadMethod {
    Ols,
    Ratio,
}

impl SpreadMethod {
    pub fn from_selector(selector: u8) -> Result<Self, ConfigError> {
        match selector {
            2 => Ok(SpreadMethod::Ols),
            3 => Ok(SpreadMethod::Ratio),
            other => Err(ConfigError::UnknownMethod(other)),
        }
    }

    pub fn selector(self) -> u8 {
        match self {
            SpreadMethod::Ols => 2,
            SpreadMethod::Ratio => 3,
        }
    }
}

/// Strategy parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub method: SpreadMethod,
    /// Rolling window in bars.
    pub window: usize,
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    /// Target weight magnitude applied to each leg on a transition.
    pub order_pct: f64,
    pub initial_state: PositionState,
}

impl StrategyParams {
    /// Build and validate a parameter set.
    pub fn new(
        method: SpreadMethod,
        window: usize,
        upper_threshold: f64,
        lower_threshold: f64,
        order_pct: f64,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            method,
            window,
            upper_threshold,
            lower_threshold,
            order_pct,
            initial_state: PositionState::Flat,
        };
        params.validate()?;
        Ok(params)
    }

    /// Symmetric thresholds: `lower = -upper`.
    pub fn symmetric(
        method: SpreadMethod,
        window: usize,
        threshold: f64,
        order_pct: f64,
    ) -> Result<Self, ConfigError> {
        Self::new(method, window, threshold, -threshold, order_pct)
    }

    pub fn with_initial_state(mut self, state: PositionState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::InvalidWindow(self.window));
        }
        let (upper, lower) = (self.upper_threshold, self.lower_threshold);
        if !(upper.is_finite() && lower.is_finite() && upper > 0.0 && lower < 0.0) {
            return Err(ConfigError::DegenerateThresholds { upper, lower });
        }
        if !(self.order_pct > 0.0 && self.order_pct <= 1.0) {
            return Err(ConfigError::InvalidOrderPct(self.order_pct));
        }
        Ok(())
    }
}
