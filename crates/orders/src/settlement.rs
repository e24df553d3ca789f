use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_core::{DomainError, DomainResult, Money};
use vendora_catalog::ProductId;

use crate::order::OrderItem;

/// One line of an incoming cart: which product, how many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A cart line resolved against the storefront: retail and base prices
/// captured, product details snapshotted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub product_image: Option<String>,
    pub unit_price: Money,
    pub base_price: Money,
    pub quantity: i64,
}

impl PricedLine {
    /// Retail total for the line.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Reseller's earnings on the line: (retail - base) * quantity.
    pub fn commission(&self) -> Money {
        (self.unit_price - self.base_price) * self.quantity
    }
}

/// Settlement knobs. Tax applies to the subtotal only, not shipping.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    pub tax_rate: Decimal,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            // GST standard rate.
            tax_rate: Decimal::new(18, 2),
        }
    }
}

/// Pluggable shipping cost computation.
pub trait ShippingPolicy: Send + Sync {
    fn shipping_cost(&self, subtotal: Money, lines: &[PricedLine]) -> Money;
}

/// Default policy: shipping is free.
#[derive(Debug, Default, Clone, Copy)]
pub struct FreeShipping;

impl ShippingPolicy for FreeShipping {
    fn shipping_cost(&self, _subtotal: Money, _lines: &[PricedLine]) -> Money {
        Money::ZERO
    }
}

/// Fixed cost per order regardless of contents.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateShipping(pub Money);

impl ShippingPolicy for FlatRateShipping {
    fn shipping_cost(&self, _subtotal: Money, _lines: &[PricedLine]) -> Money {
        self.0
    }
}

/// The financial outcome of settling a cart.
///
/// Invariants (all amounts rounded to two decimal places):
/// - `total_amount = subtotal + shipping_cost + tax_amount`
/// - `reseller_commission + manufacturer_amount = total_amount`
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub reseller_commission: Money,
    pub manufacturer_amount: Money,
}

/// Settle a priced cart into order totals and the commission split.
///
/// Pure math over already-resolved lines; availability, stock decrement, and
/// floor checks happen before lines reach this point.
pub fn settle(
    lines: &[PricedLine],
    config: SettlementConfig,
    shipping: &dyn ShippingPolicy,
) -> DomainResult<Settlement> {
    if lines.is_empty() {
        return Err(DomainError::validation("order must contain at least one item"));
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if line.unit_price < line.base_price {
            return Err(DomainError::validation(
                "unit price cannot be below the base price",
            ));
        }
    }

    let items: Vec<OrderItem> = lines.iter().map(OrderItem::from_line).collect();

    let subtotal: Money = lines.iter().map(PricedLine::line_total).sum();
    let subtotal = subtotal.rounded();

    let shipping_cost = shipping.shipping_cost(subtotal, lines).rounded();
    let tax_amount = subtotal.apply_rate(config.tax_rate).rounded();
    let total_amount = subtotal + shipping_cost + tax_amount;

    let reseller_commission: Money = lines.iter().map(PricedLine::commission).sum();
    let reseller_commission = reseller_commission.rounded();

    // The manufacturer side absorbs shipping and tax.
    let manufacturer_amount = total_amount - reseller_commission;

    Ok(Settlement {
        items,
        subtotal,
        shipping_cost,
        tax_amount,
        total_amount,
        reseller_commission,
        manufacturer_amount,
    })
}

/// Human-facing order number: `ORD-YYYYMMDD-XXXXXX`.
///
/// The suffix is random; uniqueness is ultimately guaranteed by the store's
/// unique index on the column.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}
