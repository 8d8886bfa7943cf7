//! SpreadLab Core: pairs-trading signal and backtest engine.
//!
//! This crate contains:
//! - Domain types (bars, legs, orders, fills, the two-leg portfolio)
//! - Price providers (CSV candle store, synthetic series), resampling, pair alignment
//! - Period strings and strategy parameters
//! - Spread/z-score models (price ratio, rolling OLS residual)
//! - The regime state machine with pending-order gating
//! - Broker simulator and the step loop

pub mod data;
pub mod domain;
pub mod engine;
pub mod params;
pub mod period;
pub mod signal;
pub mod spread;
