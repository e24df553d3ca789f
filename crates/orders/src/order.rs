use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_core::{DomainError, DomainResult, Entity, Money, ResellerId};
use vendora_catalog::ProductId;

use crate::settlement::{PricedLine, Settlement, generate_order_number};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for OrderId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<OrderId> for Uuid {
    fn from(value: OrderId) -> Self {
        value.0
    }
}

/// Order lifecycle.
///
/// The graph is strictly forward with cancellation possible up to shipment:
///
/// ```text
/// Pending -> Confirmed -> Processing -> Shipped -> Delivered
///    |           |            |
///    +-----------+------------+--> Cancelled
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state, tracked independently of fulfilment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

/// Who placed the order. Guest checkout: no account required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl CustomerInfo {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation("customer email is invalid"));
        }
        Ok(())
    }
}

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> DomainResult<()> {
        let required = [
            ("address line 1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal code", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// A line of a placed order: product details and prices frozen at purchase
/// time, immune to later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub product_image: Option<String>,
    pub unit_price: Money,
    pub base_price: Money,
    pub quantity: i64,
    pub total_price: Money,
    pub commission_amount: Money,
}

impl OrderItem {
    pub fn from_line(line: &PricedLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            product_sku: line.product_sku.clone(),
            product_image: line.product_image.clone(),
            unit_price: line.unit_price,
            base_price: line.base_price,
            quantity: line.quantity,
            total_price: line.line_total().rounded(),
            commission_amount: line.commission().rounded(),
        }
    }
}

/// A placed order: the financial snapshot plus fulfilment state.
///
/// Money fields are set once at placement and never mutated; only status,
/// tracking, and notes move afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    reseller_id: ResellerId,
    order_number: String,
    customer: CustomerInfo,
    shipping_address: ShippingAddress,
    items: Vec<OrderItem>,

    subtotal: Money,
    shipping_cost: Money,
    tax_amount: Money,
    total_amount: Money,
    reseller_commission: Money,
    manufacturer_amount: Money,

    status: OrderStatus,
    payment_status: PaymentStatus,

    tracking_number: Option<String>,
    tracking_url: Option<String>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,

    customer_notes: Option<String>,
    internal_notes: Option<String>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Freeze a settlement into a new pending order.
    pub fn place(
        reseller_id: ResellerId,
        customer: CustomerInfo,
        shipping_address: ShippingAddress,
        settlement: Settlement,
        customer_notes: Option<String>,
    ) -> DomainResult<Self> {
        customer.validate()?;
        shipping_address.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            reseller_id,
            order_number: generate_order_number(now),
            customer,
            shipping_address,
            items: settlement.items,
            subtotal: settlement.subtotal,
            shipping_cost: settlement.shipping_cost,
            tax_amount: settlement.tax_amount,
            total_amount: settlement.total_amount,
            reseller_commission: settlement.reseller_commission,
            manufacturer_amount: settlement.manufacturer_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            tracking_number: None,
            tracking_url: None,
            shipped_at: None,
            delivered_at: None,
            customer_notes,
            internal_notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn reseller_id(&self) -> ResellerId {
        self.reseller_id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn tax_amount(&self) -> Money {
        self.tax_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn reseller_commission(&self) -> Money {
        self.reseller_commission
    }

    pub fn manufacturer_amount(&self) -> Money {
        self.manufacturer_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn tracking_url(&self) -> Option<&str> {
        self.tracking_url.as_deref()
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn customer_notes(&self) -> Option<&str> {
        self.customer_notes.as_deref()
    }

    pub fn internal_notes(&self) -> Option<&str> {
        self.internal_notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Commission counts toward the reseller's balance only once delivered.
    pub fn is_commissionable(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    /// Move the order along the lifecycle graph.
    ///
    /// Terminal orders report `OrderAlreadyFinalized`; a non-adjacent target
    /// reports `InvalidTransition`. Shipment and delivery transitions stamp
    /// their timestamps.
    pub fn transition_to(&mut self, next: OrderStatus) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::OrderAlreadyFinalized {
                status: self.status.as_str().to_string(),
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        let now = Utc::now();
        match next {
            OrderStatus::Shipped => self.shipped_at = Some(now),
            OrderStatus::Delivered => self.delivered_at = Some(now),
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_tracking(&mut self, number: Option<String>, url: Option<String>) {
        self.tracking_number = number;
        self.tracking_url = url;
        self.updated_at = Utc::now();
    }

    /// Record the payment state as settled outside the engine.
    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_internal_notes(&mut self, notes: Option<String>) {
        self.internal_notes = notes;
        self.updated_at = Utc::now();
    }

}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::{FreeShipping, SettlementConfig, settle};

    fn order() -> Order {
        let line = PricedLine {
            product_id: ProductId::new(),
            product_name: "Forge Anvil".into(),
            product_sku: "SKU-001".into(),
            product_image: None,
            unit_price: Money::from_major(1200),
            base_price: Money::from_major(1000),
            quantity: 2,
        };
        let settlement = settle(&[line], SettlementConfig::default(), &FreeShipping).unwrap();
        Order::place(
            ResellerId::new(),
            CustomerInfo {
                name: "Asha Rao".into(),
                email: "asha@example.com".into(),
                phone: None,
            },
            ShippingAddress {
                line1: "12 MG Road".into(),
                line2: None,
                city: "Bengaluru".into(),
                state: "Karnataka".into(),
                postal_code: "560001".into(),
                country: "India".into(),
            },
            settlement,
            None,
        )
        .unwrap()
    }

    #[test]
    fn placement_freezes_the_snapshot() {
        let o = order();
        assert_eq!(o.status(), OrderStatus::Pending);
        assert_eq!(o.payment_status(), PaymentStatus::Pending);
        assert_eq!(o.subtotal(), Money::from_major(2400));
        assert_eq!(o.tax_amount(), Money::from_major(432));
        assert_eq!(o.total_amount(), Money::from_major(2832));
        assert_eq!(o.reseller_commission(), Money::from_major(400));
        assert_eq!(o.manufacturer_amount(), Money::from_major(2432));
        assert!(o.order_number().starts_with("ORD-"));
    }

    #[test]
    fn happy_path_stamps_timestamps() {
        let mut o = order();
        o.transition_to(OrderStatus::Confirmed).unwrap();
        o.transition_to(OrderStatus::Processing).unwrap();
        assert!(o.shipped_at().is_none());

        o.transition_to(OrderStatus::Shipped).unwrap();
        assert!(o.shipped_at().is_some());
        assert!(o.delivered_at().is_none());

        o.transition_to(OrderStatus::Delivered).unwrap();
        assert!(o.delivered_at().is_some());
        assert!(o.is_commissionable());
    }

    #[test]
    fn cannot_skip_stages() {
        let mut o = order();
        let err = o.transition_to(OrderStatus::Shipped).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "pending".into(),
                to: "shipped".into()
            }
        );
        assert_eq!(o.status(), OrderStatus::Pending);
    }

    #[test]
    fn shipped_orders_cannot_cancel() {
        let mut o = order();
        o.transition_to(OrderStatus::Confirmed).unwrap();
        o.transition_to(OrderStatus::Processing).unwrap();
        o.transition_to(OrderStatus::Shipped).unwrap();

        let err = o.transition_to(OrderStatus::Cancelled).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "shipped".into(),
                to: "cancelled".into()
            }
        );
    }

    #[test]
    fn terminal_orders_are_finalized() {
        let mut o = order();
        o.transition_to(OrderStatus::Cancelled).unwrap();

        let err = o.transition_to(OrderStatus::Confirmed).unwrap_err();
        assert_eq!(
            err,
            DomainError::OrderAlreadyFinalized {
                status: "cancelled".into()
            }
        );
        assert!(!o.is_commissionable());
    }

    #[test]
    fn cancellation_allowed_until_shipment() {
        for stage in [OrderStatus::Confirmed, OrderStatus::Processing] {
            let mut o = order();
            o.transition_to(OrderStatus::Confirmed).unwrap();
            if stage == OrderStatus::Processing {
                o.transition_to(OrderStatus::Processing).unwrap();
            }
            o.transition_to(OrderStatus::Cancelled).unwrap();
            assert_eq!(o.status(), OrderStatus::Cancelled);
        }
    }

    #[test]
    fn rejects_invalid_customer_or_address() {
        let line = PricedLine {
            product_id: ProductId::new(),
            product_name: "Forge Anvil".into(),
            product_sku: "SKU-001".into(),
            product_image: None,
            unit_price: Money::from_major(1200),
            base_price: Money::from_major(1000),
            quantity: 1,
        };
        let settlement = settle(&[line], SettlementConfig::default(), &FreeShipping).unwrap();
        let err = Order::place(
            ResellerId::new(),
            CustomerInfo {
                name: "Asha Rao".into(),
                email: "not-an-email".into(),
                phone: None,
            },
            ShippingAddress {
                line1: "12 MG Road".into(),
                line2: None,
                city: "Bengaluru".into(),
                state: "Karnataka".into(),
                postal_code: "560001".into(),
                country: "India".into(),
            },
            settlement,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
