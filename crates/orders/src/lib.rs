//! `vendora-orders` — order placement, settlement math, and the status
//! lifecycle.
//!
//! Settlement is a pure computation over priced cart lines; the order entity
//! freezes the result as an immutable financial snapshot. Later changes to
//! products or listing prices never alter a placed order.

pub mod events;
pub mod order;
pub mod settlement;

pub use events::{OrderEvent, OrderPlaced, OrderStatusChanged};
pub use order::{
    CustomerInfo, Order, OrderId, OrderItem, OrderStatus, PaymentStatus, ShippingAddress,
};
pub use settlement::{
    CartLine, FlatRateShipping, FreeShipping, PricedLine, Settlement, SettlementConfig,
    ShippingPolicy, generate_order_number, settle,
};
