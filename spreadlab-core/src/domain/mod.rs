//! Domain types shared by the data layer, the signal and the broker.

pub mod bar;
pub mod fill;
pub mod ids;
pub mod order;
pub mod portfolio;

pub use bar::Bar;
pub use fill::Fill;
pub use ids::{IdGen, OrderId};
pub use order::{Leg, Order, OrderStatus, TargetOrder};
pub use portfolio::Portfolio;
