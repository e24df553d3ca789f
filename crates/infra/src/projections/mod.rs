//! Projection implementations (read model builders).
//!
//! Projections consume post-commit notifications and build query-optimized
//! read models. All projections are:
//! - **Rebuildable**: Can be reconstructed by replaying notifications
//! - **Reseller-isolated**: Data is partitioned by reseller
//! - **Idempotent**: Safe for at-least-once delivery (dedup on `event_id`)

pub mod reseller_stats;

pub use reseller_stats::{
    OrderSummary, ResellerStats, ResellerStatsError, ResellerStatsProjection,
};
