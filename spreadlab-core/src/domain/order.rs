//! Pair legs, target orders, and simulator order records.

use super::ids::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of the traded pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    /// The numerator asset (regressand in OLS mode).
    A,
    /// The denominator asset (regressor in OLS mode).
    B,
}

impl Leg {
    pub const BOTH: [Leg; 2] = [Leg::A, Leg::B];

    pub fn index(self) -> usize {
        match self {
            Leg::A => 0,
            Leg::B => 1,
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::A => write!(f, "A"),
            Leg::B => write!(f, "B"),
        }
    }
}

/// Instruction to rebalance one leg to a fraction of portfolio value.
///
/// Negative weights are short positions. Weights are always in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetOrder {
    pub leg: Leg,
    pub target_weight: f64,
}

impl TargetOrder {
    pub fn new(leg: Leg, target_weight: f64) -> Self {
        Self { leg, target_weight }
    }
}

/// Order lifecycle states inside the broker simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the broker, waiting for its fill step.
    Submitted,
    /// Fully filled.
    Completed,
    /// Refused at fill time (insufficient cash for a buy).
    Rejected,
    /// Still open when the run ended.
    Cancelled,
}

impl OrderStatus {
    pub fn is_open(self) -> bool {
        self == OrderStatus::Submitted
    }
}

/// A market order tracked by the broker.
///
/// `size` is signed: positive buys, negative sells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub leg: Leg,
    pub size: f64,
    pub target_weight: f64,
    pub status: OrderStatus,
    pub created_step: usize,
    /// First step at which the order may fill.
    pub fill_step: usize,
    pub filled_step: Option<usize>,
    pub fill_price: Option<f64>,
    pub commission: f64,
}

impl Order {
    pub fn is_buy(&self) -> bool {
        self.size > 0.0
    }

    /// Traded notional at the fill price (zero while unfilled).
    pub fn notional(&self) -> f64 {
        self.fill_price.map_or(0.0, |p| p * self.size.abs())
    }
}
