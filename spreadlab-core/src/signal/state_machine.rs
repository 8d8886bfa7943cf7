//! Regime state machine for the spread.
//!
//! Three regimes (`Flat`, `ShortSpread`, `LongSpread`) plus a pending-order
//! flag. `on_step` is the only call that changes the regime; it refuses to act
//! while a previous order cycle is unresolved, so at most one pair of target
//! orders is ever in flight.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{Leg, TargetOrder};
use crate::params::StrategyParams;

/// Current directional stance on the spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    #[default]
    Flat,
    /// Short A, long B: the spread is expected to fall.
    ShortSpread,
    /// Long A, short B: the spread is expected to rise.
    LongSpread,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionState::Flat => "FLAT",
            PositionState::ShortSpread => "SHORT_SPREAD",
            PositionState::LongSpread => "LONG_SPREAD",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PositionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" | "0" => Ok(PositionState::Flat),
            "short_spread" | "short" | "1" => Ok(PositionState::ShortSpread),
            "long_spread" | "long" | "2" => Ok(PositionState::LongSpread),
            other => Err(format!("unknown position state '{other}'")),
        }
    }
}

/// A regime change and the target orders that implement it.
///
/// Orders are listed in submission order: the leg being sold comes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: PositionState,
    pub to: PositionState,
    pub zscore: f64,
    pub orders: [TargetOrder; 2],
}

/// Regime + pending-order state for one strategy instance.
#[derive(Debug, Clone)]
pub struct SignalMachine {
    params: StrategyParams,
    state: PositionState,
    pending: bool,
}

impl SignalMachine {
    pub fn new(params: StrategyParams) -> Self {
        let state = params.initial_state;
        Self {
            params,
            state,
            pending: false,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Evaluate one step.
    ///
    /// Returns the transition (and marks an order cycle as pending) when the
    /// z-score crosses a threshold into a regime the machine is not already in.
    /// Undefined z-scores and steps with an unresolved order cycle are no-ops.
    pub fn on_step(&mut self, zscore: Option<f64>) -> Option<Transition> {
        if self.pending {
            return None;
        }
        let z = zscore.filter(|z| z.is_finite())?;
        let pct = self.params.order_pct;

        let (to, orders) = if z > self.params.upper_threshold
            && self.state != PositionState::ShortSpread
        {
            (
                PositionState::ShortSpread,
                [TargetOrder::new(Leg::A, -pct), TargetOrder::new(Leg::B, pct)],
            )
        } else if z < self.params.lower_threshold && self.state != PositionState::LongSpread {
            (
                PositionState::LongSpread,
                [TargetOrder::new(Leg::B, -pct), TargetOrder::new(Leg::A, pct)],
            )
        } else {
            return None;
        };

        let transition = Transition {
            from: self.state,
            to,
            zscore: z,
            orders,
        };
        self.state = to;
        self.pending = true;
        Some(transition)
    }

    /// The broker has resolved every order of the pending cycle.
    pub fn on_order_resolved(&mut self) {
        self.pending = false;
    }

    /// Positions were closed outside the signal path (end-of-run liquidation).
    pub fn reset_flat(&mut self) {
        self.state = PositionState::Flat;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SpreadMethod;

    fn machine() -> SignalMachine {
        SignalMachine::new(StrategyParams::symmetric(SpreadMethod::Ratio, 10, 2.5, 0.5).unwrap())
    }

    #[test]
    fn starts_flat_and_idle() {
        let m = machine();
        assert_eq!(m.state(), PositionState::Flat);
        assert!(!m.is_pending());
    }

    #[test]
    fn upper_crossing_shorts_the_spread() {
        let mut m = machine();
        let t = m.on_step(Some(3.0)).unwrap();
        assert_eq!(t.from, PositionState::Flat);
        assert_eq!(t.to, PositionState::ShortSpread);
        assert_eq!(
            t.orders,
            [TargetOrder::new(Leg::A, -0.5), TargetOrder::new(Leg::B, 0.5)]
        );
        assert_eq!(m.state(), PositionState::ShortSpread);
        assert!(m.is_pending());
    }

    #[test]
    fn lower_crossing_longs_the_spread() {
        let mut m = machine();
        let t = m.on_step(Some(-3.0)).unwrap();
        assert_eq!(t.to, PositionState::LongSpread);
        assert_eq!(
            t.orders,
            [TargetOrder::new(Leg::B, -0.5), TargetOrder::new(Leg::A, 0.5)]
        );
    }

    #[test]
    fn thresholds_are_strict() {
        let mut m = machine();
        assert!(m.on_step(Some(2.5)).is_none());
        assert!(m.on_step(Some(-2.5)).is_none());
        assert_eq!(m.state(), PositionState::Flat);
    }

    #[test]
    fn dead_zone_never_flattens() {
        let mut m = machine();
        m.on_step(Some(3.0)).unwrap();
        m.on_order_resolved();
        for z in [0.0, 1.0, -1.0, 2.4, -2.4] {
            assert!(m.on_step(Some(z)).is_none());
        }
        assert_eq!(m.state(), PositionState::ShortSpread);
    }

    #[test]
    fn same_regime_is_idempotent() {
        let mut m = machine();
        m.on_step(Some(3.0)).unwrap();
        m.on_order_resolved();
        for _ in 0..5 {
            assert!(m.on_step(Some(4.0)).is_none());
        }
        assert!(!m.is_pending());
    }

    #[test]
    fn pending_blocks_any_evaluation() {
        let mut m = machine();
        m.on_step(Some(3.0)).unwrap();
        // Opposite extreme while the first cycle is unresolved
        assert!(m.on_step(Some(-9.0)).is_none());
        assert_eq!(m.state(), PositionState::ShortSpread);

        m.on_order_resolved();
        let t = m.on_step(Some(-9.0)).unwrap();
        assert_eq!(t.from, PositionState::ShortSpread);
        assert_eq!(t.to, PositionState::LongSpread);
    }

    #[test]
    fn undefined_zscore_is_ignored() {
        let mut m = machine();
        assert!(m.on_step(None).is_none());
        assert!(m.on_step(Some(f64::NAN)).is_none());
        assert!(m.on_step(Some(f64::INFINITY)).is_none());
        assert_eq!(m.state(), PositionState::Flat);
        assert!(!m.is_pending());
    }

    #[test]
    fn short_branch_wins_when_both_conditions_hold() {
        // upper < lower cannot pass validation; build it directly
        let params = StrategyParams {
            method: SpreadMethod::Ratio,
            window: 10,
            upper_threshold: 1.0,
            lower_threshold: 2.0,
            order_pct: 0.5,
            initial_state: PositionState::Flat,
        };
        let mut m = SignalMachine::new(params);
        let t = m.on_step(Some(1.5)).unwrap();
        assert_eq!(t.to, PositionState::ShortSpread);
    }

    #[test]
    fn initial_state_is_configurable() {
        let params = StrategyParams::symmetric(SpreadMethod::Ratio, 10, 2.5, 0.5)
            .unwrap()
            .with_initial_state(PositionState::ShortSpread);
        let mut m = SignalMachine::new(params);
        assert!(m.on_step(Some(3.0)).is_none());
    }

    #[test]
    fn reset_flat_clears_everything() {
        let mut m = machine();
        m.on_step(Some(-3.0)).unwrap();
        m.reset_flat();
        assert_eq!(m.state(), PositionState::Flat);
        assert!(!m.is_pending());
    }

    #[test]
    fn parse_and_display_states() {
        assert_eq!("flat".parse::<PositionState>(), Ok(PositionState::Flat));
        assert_eq!("1".parse::<PositionState>(), Ok(PositionState::ShortSpread));
        assert_eq!("LONG_SPREAD".parse::<PositionState>(), Ok(PositionState::LongSpread));
        assert!("sideways".parse::<PositionState>().is_err());
        assert_eq!(PositionState::ShortSpread.to_string(), "SHORT_SPREAD");
    }
}
