use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker-assigned order identifier, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// Monotonic ID generator for orders.
#[derive(Debug, Default)]
pub struct IdGen {
    next_order: u64,
}

impl IdGen {
    pub fn next_order_id(&mut self) -> OrderId {
        self.next_order += 1;
        OrderId(self.next_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut gen = IdGen::default();
        let a = gen.next_order_id();
        let b = gen.next_order_id();
        assert!(b > a);
        assert_eq!(a.to_string(), "O1");
    }
}
