//! Portfolio: cash plus signed holdings in the two legs.

use super::fill::Fill;
use super::order::Leg;

/// Aggregate portfolio state for a two-leg pair.
///
/// Positions are signed unit counts (negative = short). The accounting identity
/// must hold at every step: `value == cash + sum(position * price)`.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    positions: [f64; 2],
    pub total_commission: f64,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            positions: [0.0; 2],
            total_commission: 0.0,
        }
    }

    /// Signed units held in a leg.
    pub fn position(&self, leg: Leg) -> f64 {
        self.positions[leg.index()]
    }

    /// Portfolio value at the given `[price_a, price_b]`.
    pub fn value(&self, prices: [f64; 2]) -> f64 {
        self.cash + self.positions[0] * prices[0] + self.positions[1] * prices[1]
    }

    /// Whether both legs are flat.
    pub fn is_flat(&self) -> bool {
        self.positions.iter().all(|p| *p == 0.0)
    }

    /// Apply a fill: move cash by the traded notional and deduct commission.
    pub fn apply_fill(&mut self, fill: &Fill) {
        self.cash -= fill.size * fill.price;
        self.cash -= fill.commission;
        self.total_commission += fill.commission;
        self.positions[fill.leg.index()] += fill.size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;
    use chrono::Utc;

    fn fill(leg: Leg, size: f64, price: f64, commission: f64) -> Fill {
        Fill {
            order_id: OrderId(1),
            step: 0,
            timestamp: Utc::now(),
            leg,
            size,
            price,
            commission,
        }
    }

    #[test]
    fn value_with_no_positions() {
        let portfolio = Portfolio::new(1_000.0);
        assert_eq!(portfolio.value([10.0, 20.0]), 1_000.0);
        assert!(portfolio.is_flat());
    }

    #[test]
    fn long_fill_moves_cash_into_position() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.apply_fill(&fill(Leg::A, 10.0, 50.0, 1.0));
        assert_eq!(portfolio.cash, 1_000.0 - 500.0 - 1.0);
        assert_eq!(portfolio.position(Leg::A), 10.0);
        // Unchanged price: value only lost the commission
        assert_eq!(portfolio.value([50.0, 0.0]), 999.0);
    }

    #[test]
    fn short_fill_credits_cash() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.apply_fill(&fill(Leg::B, -4.0, 100.0, 0.0));
        assert_eq!(portfolio.cash, 1_400.0);
        assert_eq!(portfolio.position(Leg::B), -4.0);
        // B rallies to 110: short loses 40
        assert_eq!(portfolio.value([0.0, 110.0]), 960.0);
        assert!(!portfolio.is_flat());
    }
}
