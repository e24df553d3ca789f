//! `vendora-pricing` — the markup floor policy.
//!
//! Every reseller listing must retail at or above the manufacturer's floor:
//!
//! ```text
//! required_minimum = base_price * (1 + minimum_markup_percent / 100)
//! ```
//!
//! The floor is rounded to two decimal places before comparison and the
//! boundary is inclusive: retailing exactly at the floor is allowed. All
//! functions here are pure; enforcement points live in the catalog layer.

pub mod policy;

pub use policy::{PricingPolicy, margin, margin_percent};
