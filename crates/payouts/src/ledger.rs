use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, Money};
use vendora_orders::Order;

use crate::payout::Payout;

/// Default minimum withdrawal.
pub fn minimum_payout() -> Money {
    Money::from_major(100)
}

/// A reseller's commission position, derived in full on every read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Commission across all delivered orders, ever.
    pub total_earned: Money,
    /// Amount in completed payouts.
    pub total_withdrawn: Money,
    /// Amount locked in pending/processing payouts.
    pub pending_withdrawals: Money,
    /// What a new payout may draw on, floored at zero.
    pub available: Money,
}

/// Derive the balance position from the reseller's orders and payouts.
///
/// Only delivered orders earn; every payout that is not failed holds its
/// amount out. The subtraction can go temporarily negative when a delivered
/// order is later disputed, hence the zero floor.
pub fn summarize<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    payouts: impl IntoIterator<Item = &'a Payout>,
) -> BalanceSummary {
    let total_earned: Money = orders
        .into_iter()
        .filter(|o| o.is_commissionable())
        .map(Order::reseller_commission)
        .sum();

    let mut total_withdrawn = Money::ZERO;
    let mut pending_withdrawals = Money::ZERO;
    for p in payouts {
        match p.status() {
            s if !s.counts_against_balance() => {}
            crate::PayoutStatus::Completed => total_withdrawn += p.amount(),
            _ => pending_withdrawals += p.amount(),
        }
    }

    let available = (total_earned - total_withdrawn - pending_withdrawals).max(Money::ZERO);

    BalanceSummary {
        total_earned,
        total_withdrawn,
        pending_withdrawals,
        available,
    }
}

/// Resolve a withdrawal request against the current balance.
///
/// `requested = None` means "everything available". A concrete request is
/// clamped down to the available balance, never up. The resolved amount must
/// clear `minimum`.
pub fn resolve_request(
    summary: &BalanceSummary,
    requested: Option<Money>,
    minimum: Money,
) -> DomainResult<Money> {
    if !summary.available.is_positive() {
        return Err(DomainError::NoBalance);
    }

    let amount = match requested {
        Some(r) if !r.is_positive() => {
            return Err(DomainError::validation("payout amount must be positive"));
        }
        Some(r) => r.min(summary.available),
        None => summary.available,
    };

    if amount < minimum {
        return Err(DomainError::BelowMinimum {
            minimum,
            requested: amount,
        });
    }

    Ok(amount)
}
