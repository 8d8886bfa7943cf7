//! Signal state machine: z-scores in, regime transitions and target orders out.

pub mod state_machine;

pub use state_machine::{PositionState, SignalMachine, Transition};
