//! Executed trade on one leg.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::OrderId;
use crate::domain::order::Leg;

/// One order filled in full at the step's open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub leg: Leg,
    /// Signed traded quantity (positive = bought).
    pub size: f64,
    pub price: f64,
    pub commission: f64,
}
