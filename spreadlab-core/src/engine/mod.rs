//! Backtest engine: broker simulator, analyzers, and the step loop.
//!
//! Per step:
//! 1. fill due orders at the step's open
//! 2. clear the pending flag once the broker has nothing open
//! 3. evaluate the z-score and the state machine
//! 4. submit target orders for a transition
//! 5. mark to market, notify analyzers, record the step

pub mod analyzer;
pub mod broker;
pub mod loop_runner;
pub mod state;

pub use analyzer::{Analyzer, ValueRecorder};
pub use broker::{Broker, BrokerConfig};
pub use loop_runner::run_pair_backtest;
pub use state::{EngineConfig, EvalMode, RunResult, StepRecord, TransitionRecord};
