//! Infrastructure layer: storage backends, the settlement engine, and read
//! models.
//!
//! The [`store::Store`] trait is the transactional boundary: every atomic
//! business operation (place order, create payout) is a single store method
//! whose implementation runs check and write in one transaction scope. The
//! [`engine::SettlementEngine`] composes a store with an event bus and adds
//! authorization and post-commit notification on top.

pub mod engine;
pub mod projections;
pub mod read_model;
pub mod store;

mod integration_tests;
