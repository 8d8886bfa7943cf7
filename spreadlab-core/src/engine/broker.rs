//! Broker simulator for a two-leg portfolio.
//!
//! Orders are target-percent market orders sized from the close of the step
//! they are submitted on and filled at the open of a later step
//! (`fill_delay` steps later, at least one). No same-bar fills.
//!
//! Cash rules:
//! - commission = rate * |size| * fill price, deducted from cash
//! - a buy whose cost plus commission exceeds cash is rejected
//! - short sales are allowed and credit cash

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::analyzer::Analyzer;
use crate::domain::{Fill, IdGen, Leg, Order, OrderId, OrderStatus, Portfolio};
use crate::params::ConfigError;

/// Order sizes below this magnitude are treated as zero.
const SIZE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub initial_cash: f64,
    /// Fractional commission on traded notional (0.002 = 0.2%).
    pub commission: f64,
    /// Steps between submission and fill. Must be at least 1.
    pub fill_delay: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            initial_cash: 1000.0,
            commission: 0.002,
            fill_delay: 1,
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::InvalidBroker(format!(
                "initial cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if !(self.commission.is_finite() && (0.0..1.0).contains(&self.commission)) {
            return Err(ConfigError::InvalidBroker(format!(
                "commission must be in [0, 1), got {}",
                self.commission
            )));
        }
        if self.fill_delay == 0 {
            return Err(ConfigError::InvalidBroker(
                "fill delay must be at least one step".into(),
            ));
        }
        Ok(())
    }
}

pub struct Broker {
    config: BrokerConfig,
    portfolio: Portfolio,
    orders: Vec<Order>,
    fills: Vec<Fill>,
    ids: IdGen,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            portfolio: Portfolio::new(config.initial_cash),
            config,
            orders: Vec::new(),
            fills: Vec::new(),
            ids: IdGen::default(),
            analyzers: Vec::new(),
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash
    }

    pub fn position(&self, leg: Leg) -> f64 {
        self.portfolio.position(leg)
    }

    /// Marked-to-market value at the given `[A, B]` prices.
    pub fn portfolio_value(&self, prices: [f64; 2]) -> f64 {
        self.portfolio.value(prices)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn is_open(&self, id: OrderId) -> bool {
        self.order(id).is_some_and(|o| o.status.is_open())
    }

    pub fn has_open_orders(&self) -> bool {
        self.orders.iter().any(|o| o.status.is_open())
    }

    /// Submit a market order moving `leg` to `target_weight` of portfolio
    /// value, sized from the `[A, B]` closes of `step`.
    ///
    /// A target already met completes immediately without a fill. An
    /// unusable close price rejects the order.
    pub fn submit_target_percent(
        &mut self,
        leg: Leg,
        target_weight: f64,
        step: usize,
        closes: [f64; 2],
    ) -> OrderId {
        let id = self.ids.next_order_id();
        let close = closes[leg.index()];
        let value = self.portfolio.value(closes);

        let mut order = Order {
            id,
            leg,
            size: 0.0,
            target_weight,
            status: OrderStatus::Submitted,
            created_step: step,
            fill_step: step + self.config.fill_delay,
            filled_step: None,
            fill_price: None,
            commission: 0.0,
        };

        if !(close.is_finite() && close > 0.0 && value.is_finite()) {
            order.status = OrderStatus::Rejected;
            debug!(order = %id, %leg, close, "order rejected: unusable sizing price");
        } else {
            let target_units = target_weight * value / close;
            let size = target_units - self.portfolio.position(leg);
            if size.abs() < SIZE_EPSILON {
                order.status = OrderStatus::Completed;
                order.filled_step = Some(step);
            } else {
                order.size = size;
            }
            debug!(order = %id, %leg, target_weight, size, step, "order submitted");
        }

        self.orders.push(order);
        id
    }

    /// Fill every open order due at `step` at the `[A, B]` opens.
    ///
    /// Orders are processed in submission order, so the leg sold first
    /// funds the leg bought second.
    pub fn process_fills(
        &mut self,
        step: usize,
        timestamp: DateTime<Utc>,
        opens: [f64; 2],
    ) -> Vec<Fill> {
        let mut new_fills = Vec::new();
        let rate = self.config.commission;

        for order in self
            .orders
            .iter_mut()
            .filter(|o| o.status.is_open() && o.fill_step <= step)
        {
            let price = opens[order.leg.index()];
            if !(price.is_finite() && price > 0.0) {
                order.status = OrderStatus::Rejected;
                debug!(order = %order.id, price, "order rejected: unusable fill price");
                continue;
            }

            let commission = rate * order.size.abs() * price;
            if order.is_buy() && order.size * price + commission > self.portfolio.cash {
                order.status = OrderStatus::Rejected;
                debug!(
                    order = %order.id,
                    cost = order.size * price + commission,
                    cash = self.portfolio.cash,
                    "order rejected: insufficient cash"
                );
                continue;
            }

            let fill = Fill {
                order_id: order.id,
                step,
                timestamp,
                leg: order.leg,
                size: order.size,
                price,
                commission,
            };
            self.portfolio.apply_fill(&fill);
            order.status = OrderStatus::Completed;
            order.filled_step = Some(step);
            order.fill_price = Some(price);
            order.commission = commission;
            debug!(order = %order.id, leg = %order.leg, size = order.size, price, commission, "order filled");
            new_fills.push(fill);
        }

        self.fills.extend(new_fills.iter().cloned());
        new_fills
    }

    /// Cancel every open order. Returns how many were cancelled.
    pub fn cancel_open(&mut self) -> usize {
        let mut cancelled = 0;
        for order in self.orders.iter_mut().filter(|o| o.status.is_open()) {
            order.status = OrderStatus::Cancelled;
            cancelled += 1;
        }
        cancelled
    }

    /// Close both legs immediately at the `[A, B]` closes, with commission.
    pub fn liquidate(
        &mut self,
        step: usize,
        timestamp: DateTime<Utc>,
        closes: [f64; 2],
    ) -> Vec<Fill> {
        let mut new_fills = Vec::new();
        for leg in Leg::BOTH {
            let position = self.portfolio.position(leg);
            let price = closes[leg.index()];
            if position.abs() < SIZE_EPSILON || !(price.is_finite() && price > 0.0) {
                continue;
            }
            let id = self.ids.next_order_id();
            let size = -position;
            let commission = self.config.commission * size.abs() * price;
            let fill = Fill {
                order_id: id,
                step,
                timestamp,
                leg,
                size,
                price,
                commission,
            };
            self.portfolio.apply_fill(&fill);
            self.orders.push(Order {
                id,
                leg,
                size,
                target_weight: 0.0,
                status: OrderStatus::Completed,
                created_step: step,
                fill_step: step,
                filled_step: Some(step),
                fill_price: Some(price),
                commission,
            });
            debug!(order = %id, %leg, size, price, "position liquidated");
            new_fills.push(fill);
        }
        self.fills.extend(new_fills.iter().cloned());
        new_fills
    }

    pub fn add_analyzer(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    /// Feed the step's portfolio value to every analyzer.
    pub fn notify_value(&mut self, step: usize, value: f64) {
        for analyzer in &mut self.analyzers {
            analyzer.on_value(step, value);
        }
    }

    /// Finish all analyzers and collect their results by name.
    pub fn finish_analyzers(&mut self) -> BTreeMap<String, Option<f64>> {
        self.analyzers
            .iter_mut()
            .map(|a| {
                a.finish();
                (a.name().to_string(), a.value())
            })
            .collect()
    }
}
