//! `vendora-payouts` — the reseller commission ledger.
//!
//! The available balance is always derived, never cached:
//!
//! ```text
//! available = Σ commission(delivered orders) - Σ amount(payouts not failed)
//! ```
//!
//! floored at zero. A payout request locks its amount the moment the row is
//! created, so two racing requests can never both draw on the same
//! commission.

pub mod events;
pub mod ledger;
pub mod payout;

pub use events::{PayoutEvent, PayoutRequested, PayoutStatusChanged};
pub use ledger::{BalanceSummary, minimum_payout, resolve_request, summarize};
pub use payout::{Payout, PayoutId, PayoutStatus};
