use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, Money, ValueObject};

/// A manufacturer's pricing floor, captured at the point of enforcement.
///
/// The policy is read from the manufacturer at create/update time; changing
/// the manufacturer's floor later never retro-invalidates existing listings.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    minimum_markup_percent: Decimal,
}

impl PricingPolicy {
    pub fn new(minimum_markup_percent: Decimal) -> Self {
        Self {
            minimum_markup_percent,
        }
    }

    pub fn minimum_markup_percent(&self) -> Decimal {
        self.minimum_markup_percent
    }

    /// The lowest retail price this policy allows over `base_price`,
    /// rounded to two decimal places.
    pub fn required_minimum(&self, base_price: Money) -> Money {
        base_price.apply_markup(self.minimum_markup_percent).rounded()
    }

    /// Accept `proposed` iff it is at or above the floor (inclusive).
    pub fn validate_price(&self, base_price: Money, proposed: Money) -> DomainResult<()> {
        let required_minimum = self.required_minimum(base_price);
        if proposed >= required_minimum {
            Ok(())
        } else {
            Err(DomainError::PriceBelowFloor {
                required_minimum,
                proposed,
            })
        }
    }
}

impl ValueObject for PricingPolicy {}

/// Per-unit reseller margin: retail minus base.
pub fn margin(base_price: Money, retail_price: Money) -> Money {
    retail_price - base_price
}

/// Margin as a percentage of base, rounded to two decimal places.
///
/// Zero when the base price is not positive; a free or mispriced base makes
/// the ratio meaningless and must not poison management views.
pub fn margin_percent(base_price: Money, retail_price: Money) -> Decimal {
    if !base_price.is_positive() {
        return Decimal::ZERO;
    }
    let ratio = (retail_price - base_price).amount() / base_price.amount();
    (ratio * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn floor_is_base_plus_markup() {
        let policy = PricingPolicy::new(dec!(20));
        assert_eq!(policy.required_minimum(Money::from_major(1000)), Money::from_major(1200));
    }

    #[test]
    fn floor_boundary_is_inclusive() {
        let policy = PricingPolicy::new(dec!(20));
        let base = Money::from_major(1000);

        policy.validate_price(base, Money::from_major(1200)).unwrap();

        let err = policy
            .validate_price(base, Money::new(dec!(1199.99)))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::PriceBelowFloor {
                required_minimum: Money::from_major(1200),
                proposed: Money::new(dec!(1199.99)),
            }
        );
    }

    #[test]
    fn fractional_floor_rounds_before_comparison() {
        // 10.99 * 1.175 = 12.91325 -> floor 12.91, so 12.91 passes.
        let policy = PricingPolicy::new(dec!(17.5));
        let base = Money::new(dec!(10.99));
        assert_eq!(policy.required_minimum(base), Money::new(dec!(12.91)));
        policy.validate_price(base, Money::new(dec!(12.91))).unwrap();
    }

    #[test]
    fn margin_percent_guards_non_positive_base() {
        assert_eq!(margin_percent(Money::ZERO, Money::from_major(50)), Decimal::ZERO);
        assert_eq!(margin_percent(Money::from_major(-5), Money::from_major(50)), Decimal::ZERO);
        assert_eq!(
            margin_percent(Money::from_major(1000), Money::from_major(1250)),
            dec!(25.00)
        );
    }

    proptest! {
        /// Validation succeeds exactly when the proposed price clears the
        /// rounded floor.
        #[test]
        fn validate_iff_at_or_above_floor(
            base_cents in 1i64..10_000_000,
            markup_bps in 0i64..30_000,
            proposed_cents in 0i64..50_000_000,
        ) {
            let policy = PricingPolicy::new(Decimal::new(markup_bps, 2));
            let base = Money::from_minor(base_cents);
            let proposed = Money::from_minor(proposed_cents);

            let ok = policy.validate_price(base, proposed).is_ok();
            prop_assert_eq!(ok, proposed >= policy.required_minimum(base));
        }

        /// The floor is never below the base price itself.
        #[test]
        fn floor_dominates_base(base_cents in 1i64..10_000_000, markup_bps in 0i64..30_000) {
            let policy = PricingPolicy::new(Decimal::new(markup_bps, 2));
            let base = Money::from_minor(base_cents);
            prop_assert!(policy.required_minimum(base) >= base.rounded());
        }
    }
}
