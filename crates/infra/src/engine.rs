//! Settlement engine (application-level orchestration).
//!
//! Every public method is one business operation: resolve the caller,
//! enforce ownership, run the domain logic, commit through the [`Store`],
//! and publish notifications afterwards.
//!
//! ## Execution Flow
//!
//! ```text
//! Operation
//!   ↓
//! 1. Authorize (role + ownership against the caller)
//!   ↓
//! 2. Load current state from the store
//!   ↓
//! 3. Decide (pure domain logic; validation, floor checks, settlement math)
//!   ↓
//! 4. Commit through the store (one transaction scope per operation)
//!   ↓
//! 5. Publish notifications to the bus (projections, dashboards)
//! ```
//!
//! ## Delivery Semantics
//!
//! Publication happens strictly after commit. A publish failure surfaces as
//! [`EngineError::Publish`] with the state change already durable; consumers
//! are idempotent, so the caller may retry the publication or drop it.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::instrument;
use uuid::Uuid;

use vendora_auth::{Caller, Role};
use vendora_catalog::{
    BindingCreated, BindingId, BindingRemoved, BindingRepriced, BindingUpdate, CatalogBinding,
    CatalogEvent, NewBinding, Product, ProductId, ProductUpdate,
};
use vendora_core::{DomainError, Entity, Money};
use vendora_events::{Event, EventBus, EventEnvelope};
use vendora_orders::{
    CartLine, CustomerInfo, FreeShipping, Order, OrderEvent, OrderId, OrderPlaced, OrderStatus,
    OrderStatusChanged, PaymentStatus, PricedLine, SettlementConfig, ShippingAddress,
    ShippingPolicy, settle,
};
use vendora_parties::{Manufacturer, Reseller};
use vendora_payouts::{
    BalanceSummary, Payout, PayoutEvent, PayoutId, PayoutRequested, PayoutStatusChanged,
    minimum_payout,
};
use vendora_pricing::PricingPolicy;

use crate::store::{Store, StoreError};

/// Envelope entity types published by the engine.
pub const BINDING_ENTITY: &str = "catalog.binding";
pub const ORDER_ENTITY: &str = "orders.order";
pub const PAYOUT_ENTITY: &str = "payouts.payout";

/// Engine-wide knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settlement: SettlementConfig,
    pub minimum_payout: Money,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settlement: SettlementConfig::default(),
            minimum_payout: minimum_payout(),
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// Deterministic business failure (validation, floor, stock, lifecycle).
    Domain(DomainError),
    /// The storage backend failed.
    Store { operation: String, message: String },
    /// Publication failed after a successful commit (at-least-once; the
    /// state change is durable).
    Publish(String),
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::Domain(e) => write!(f, "{e}"),
            EngineError::Store { operation, message } => {
                write!(f, "storage error in {operation}: {message}")
            }
            EngineError::Publish(msg) => write!(f, "publish failed after commit: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        EngineError::Domain(value)
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => EngineError::Domain(e),
            StoreError::Backend { operation, message } => {
                EngineError::Store { operation, message }
            }
        }
    }
}

/// Outcome of one listing in a bulk reprice run.
///
/// The run is partial-success: listings that would land under the floor are
/// skipped with the error recorded, the rest are repriced.
#[derive(Debug, Clone, PartialEq)]
pub struct RepriceOutcome {
    pub binding_id: BindingId,
    pub product_id: ProductId,
    pub result: Result<Money, DomainError>,
}

/// One row of the public storefront.
#[derive(Debug, Clone, PartialEq)]
pub struct StorefrontListing {
    pub binding_id: BindingId,
    pub product_id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub retail_price: Money,
    pub compare_at_price: Option<Money>,
    pub is_featured: bool,
}

/// The public storefront at a slug: only published stores, only visible
/// listings.
#[derive(Debug, Clone, PartialEq)]
pub struct StorefrontView {
    pub store_name: String,
    pub store_description: Option<String>,
    pub listings: Vec<StorefrontListing>,
}

/// One row of the reseller's own catalog view: unfiltered, with margins.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementListing {
    pub binding: CatalogBinding,
    pub product_name: String,
    pub base_price: Money,
    pub margin: Money,
    pub margin_percent: Decimal,
    pub in_stock: bool,
    pub storefront_visible: bool,
}

/// The settlement engine: pricing policy, catalog, orders, and payouts over
/// a [`Store`] and an event bus.
///
/// Generic over both so tests run against [`crate::store::InMemoryStore`]
/// and an in-memory bus while production composes Postgres and a real
/// transport.
pub struct SettlementEngine<S, B> {
    store: S,
    bus: B,
    config: EngineConfig,
    shipping: Box<dyn ShippingPolicy>,
}

impl<S, B> SettlementEngine<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            config: EngineConfig::default(),
            shipping: Box::new(FreeShipping),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_shipping_policy(mut self, shipping: Box<dyn ShippingPolicy>) -> Self {
        self.shipping = shipping;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, B> SettlementEngine<S, B>
where
    S: Store,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    // ---- parties ----

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, slug = %slug), err)]
    pub fn register_reseller(
        &self,
        caller: &Caller,
        business_name: &str,
        slug: &str,
    ) -> Result<Reseller, EngineError> {
        caller.ensure_role(Role::Reseller)?;
        let reseller = Reseller::new(caller.user_id, business_name, slug)?;
        self.store.insert_reseller(reseller.clone())?;
        Ok(reseller)
    }

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id), err)]
    pub fn register_manufacturer(
        &self,
        caller: &Caller,
        company_name: &str,
        minimum_markup_percent: Decimal,
    ) -> Result<Manufacturer, EngineError> {
        caller.ensure_role(Role::Manufacturer)?;
        let manufacturer = Manufacturer::new(caller.user_id, company_name, minimum_markup_percent)?;
        self.store.insert_manufacturer(manufacturer.clone())?;
        Ok(manufacturer)
    }

    pub fn complete_onboarding(&self, caller: &Caller) -> Result<Reseller, EngineError> {
        let mut reseller = self.reseller_of(caller)?;
        reseller.complete_onboarding();
        self.store.update_reseller(&reseller)?;
        Ok(reseller)
    }

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id), err)]
    pub fn publish_storefront(&self, caller: &Caller) -> Result<Reseller, EngineError> {
        let mut reseller = self.reseller_of(caller)?;
        reseller.publish()?;
        self.store.update_reseller(&reseller)?;
        Ok(reseller)
    }

    pub fn unpublish_storefront(&self, caller: &Caller) -> Result<Reseller, EngineError> {
        let mut reseller = self.reseller_of(caller)?;
        reseller.unpublish();
        self.store.update_reseller(&reseller)?;
        Ok(reseller)
    }

    /// Update the storefront description shown to buyers.
    pub fn update_store_profile(
        &self,
        caller: &Caller,
        store_description: Option<String>,
    ) -> Result<Reseller, EngineError> {
        let mut reseller = self.reseller_of(caller)?;
        reseller.set_store_description(store_description);
        self.store.update_reseller(&reseller)?;
        Ok(reseller)
    }

    /// Change the manufacturer's markup floor. Prospective only: existing
    /// listings keep their prices until the next create, update, or reprice.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, %percent), err)]
    pub fn set_markup_floor(
        &self,
        caller: &Caller,
        percent: Decimal,
    ) -> Result<Manufacturer, EngineError> {
        let mut manufacturer = self.manufacturer_of(caller)?;
        manufacturer.set_minimum_markup_percent(percent)?;
        self.store.update_manufacturer(&manufacturer)?;
        Ok(manufacturer)
    }

    // ---- catalog: manufacturer side ----

    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, sku = %sku), err)]
    pub fn create_product(
        &self,
        caller: &Caller,
        sku: &str,
        name: &str,
        base_price: Money,
    ) -> Result<Product, EngineError> {
        let manufacturer = self.manufacturer_of(caller)?;
        if !manufacturer.is_active() {
            return Err(DomainError::AccessDenied.into());
        }
        let product = Product::new(*manufacturer.id(), sku, name, base_price)?;
        self.store.insert_product(product.clone())?;
        Ok(product)
    }

    #[instrument(skip(self, caller), fields(%product_id), err)]
    pub fn restock_product(
        &self,
        caller: &Caller,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Product, EngineError> {
        let mut product = self.owned_product(caller, product_id)?;
        product.restock(quantity)?;
        self.store.update_product(&product)?;
        Ok(product)
    }

    #[instrument(skip(self, caller), fields(%product_id, %base_price), err)]
    pub fn set_base_price(
        &self,
        caller: &Caller,
        product_id: ProductId,
        base_price: Money,
    ) -> Result<Product, EngineError> {
        let mut product = self.owned_product(caller, product_id)?;
        product.set_base_price(base_price)?;
        self.store.update_product(&product)?;
        Ok(product)
    }

    /// Patch a product's descriptive fields. Pricing and activation go
    /// through their own operations.
    #[instrument(skip(self, caller, update), fields(%product_id), err)]
    pub fn update_product(
        &self,
        caller: &Caller,
        product_id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, EngineError> {
        let mut product = self.owned_product(caller, product_id)?;
        product.apply_update(update);
        self.store.update_product(&product)?;
        Ok(product)
    }

    /// Activate or deactivate a product. A deactivated product drops out of
    /// every storefront and cannot be ordered; existing orders keep their
    /// snapshots.
    pub fn set_product_active(
        &self,
        caller: &Caller,
        product_id: ProductId,
        active: bool,
    ) -> Result<Product, EngineError> {
        let mut product = self.owned_product(caller, product_id)?;
        if active {
            product.activate();
        } else {
            product.deactivate();
        }
        self.store.update_product(&product)?;
        Ok(product)
    }

    pub fn products(&self, caller: &Caller) -> Result<Vec<Product>, EngineError> {
        let manufacturer = self.manufacturer_of(caller)?;
        Ok(self.store.products_by_manufacturer(*manufacturer.id())?)
    }

    // ---- catalog: reseller side ----

    /// List a product in the caller's storefront.
    ///
    /// The retail price must clear the manufacturer's floor as it stands
    /// now; one listing per (reseller, product) pair.
    #[instrument(skip(self, caller, new), fields(%product_id, retail = %new.retail_price), err)]
    pub fn list_product(
        &self,
        caller: &Caller,
        product_id: ProductId,
        new: NewBinding,
    ) -> Result<CatalogBinding, EngineError> {
        let reseller = self.reseller_of(caller)?;
        let product = self.store.product(product_id)?;
        let policy = self.policy_for(&product)?;

        let binding = CatalogBinding::create(*reseller.id(), &product, policy, new)?;
        self.store.insert_binding(binding.clone())?;

        self.publish(
            *binding.id().as_uuid(),
            BINDING_ENTITY,
            CatalogEvent::BindingCreated(BindingCreated {
                binding_id: *binding.id(),
                reseller_id: *reseller.id(),
                product_id,
                retail_price: binding.retail_price(),
                occurred_at: binding.created_at(),
            }),
        )?;
        Ok(binding)
    }

    /// Partially update a listing. A price change is revalidated against the
    /// floor as it stands now; other fields never trip it.
    #[instrument(skip(self, caller, update), fields(%binding_id), err)]
    pub fn update_listing(
        &self,
        caller: &Caller,
        binding_id: BindingId,
        update: BindingUpdate,
    ) -> Result<CatalogBinding, EngineError> {
        let (reseller, mut binding) = self.owned_binding(caller, binding_id)?;
        let product = self.store.product(binding.product_id())?;
        let policy = self.policy_for(&product)?;

        let old_price = binding.retail_price();
        binding.apply_update(&product, policy, update)?;
        self.store.update_binding(&binding)?;

        if binding.retail_price() != old_price {
            self.publish(
                *binding.id().as_uuid(),
                BINDING_ENTITY,
                CatalogEvent::BindingRepriced(BindingRepriced {
                    binding_id,
                    reseller_id: *reseller.id(),
                    old_price,
                    new_price: binding.retail_price(),
                    occurred_at: binding.updated_at(),
                }),
            )?;
        }
        Ok(binding)
    }

    #[instrument(skip(self, caller), fields(%binding_id), err)]
    pub fn remove_listing(&self, caller: &Caller, binding_id: BindingId) -> Result<(), EngineError> {
        let (reseller, binding) = self.owned_binding(caller, binding_id)?;
        self.store.delete_binding(binding_id)?;
        self.publish(
            *binding.id().as_uuid(),
            BINDING_ENTITY,
            CatalogEvent::BindingRemoved(BindingRemoved {
                binding_id,
                reseller_id: *reseller.id(),
                occurred_at: chrono::Utc::now(),
            }),
        )?;
        Ok(())
    }

    /// Reprice every listing of the caller to `base * (1 + markup%)`.
    ///
    /// Partial success: a listing whose new price would land under its
    /// manufacturer's floor is left untouched and its error recorded in the
    /// outcome; the rest are committed.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id, %markup_percent), err)]
    pub fn bulk_reprice(
        &self,
        caller: &Caller,
        markup_percent: Decimal,
    ) -> Result<Vec<RepriceOutcome>, EngineError> {
        let reseller = self.reseller_of(caller)?;
        let bindings = self.store.bindings_by_reseller(*reseller.id())?;

        let mut outcomes = Vec::with_capacity(bindings.len());
        for mut binding in bindings {
            let product = self.store.product(binding.product_id())?;
            let policy = self.policy_for(&product)?;
            let old_price = binding.retail_price();

            let result = match binding.reprice_with_markup(&product, policy, markup_percent) {
                Ok(new_price) => {
                    self.store.update_binding(&binding)?;
                    self.publish(
                        *binding.id().as_uuid(),
                        BINDING_ENTITY,
                        CatalogEvent::BindingRepriced(BindingRepriced {
                            binding_id: *binding.id(),
                            reseller_id: *reseller.id(),
                            old_price,
                            new_price,
                            occurred_at: binding.updated_at(),
                        }),
                    )?;
                    Ok(new_price)
                }
                Err(err) => Err(err),
            };

            outcomes.push(RepriceOutcome {
                binding_id: *binding.id(),
                product_id: binding.product_id(),
                result,
            });
        }
        Ok(outcomes)
    }

    // ---- views ----

    /// The public storefront at `slug`.
    ///
    /// Unpublished stores do not exist from outside; listings are filtered
    /// to active, in-stock products.
    #[instrument(skip(self), err)]
    pub fn storefront_view(&self, slug: &str) -> Result<StorefrontView, EngineError> {
        let reseller = self.published_reseller(slug)?;

        let mut listings = Vec::new();
        for binding in self.store.bindings_by_reseller(*reseller.id())? {
            let product = self.store.product(binding.product_id())?;
            if !binding.storefront_visible(&product) {
                continue;
            }
            listings.push(StorefrontListing {
                binding_id: *binding.id(),
                product_id: binding.product_id(),
                title: binding.display_title(&product).to_string(),
                description: binding
                    .custom_description()
                    .or(product.description())
                    .map(str::to_string),
                image: product.primary_image().map(str::to_string),
                retail_price: binding.retail_price(),
                compare_at_price: binding.compare_at_price(),
                is_featured: binding.is_featured(),
            });
        }

        Ok(StorefrontView {
            store_name: reseller.business_name().to_string(),
            store_description: reseller.store_description().map(str::to_string),
            listings,
        })
    }

    /// The reseller's own catalog: every listing, visible or not, with
    /// margins computed against current base prices.
    pub fn management_view(&self, caller: &Caller) -> Result<Vec<ManagementListing>, EngineError> {
        let reseller = self.reseller_of(caller)?;

        let mut listings = Vec::new();
        for binding in self.store.bindings_by_reseller(*reseller.id())? {
            let product = self.store.product(binding.product_id())?;
            listings.push(ManagementListing {
                margin: binding.margin(&product),
                margin_percent: binding.margin_percent(&product),
                product_name: product.name().to_string(),
                base_price: product.base_price(),
                in_stock: product.is_in_stock(),
                storefront_visible: binding.storefront_visible(&product),
                binding,
            });
        }
        Ok(listings)
    }

    // ---- orders ----

    /// Place a customer order against the storefront at `slug`.
    ///
    /// Prices are resolved from the live listings, the cart is settled, and
    /// order insert plus stock decrement commit in one transaction scope.
    /// The financial snapshot is frozen at this moment; later catalog edits
    /// never alter it.
    #[instrument(skip(self, cart, customer, shipping_address, customer_notes), fields(slug = %slug, lines = cart.len()), err)]
    pub fn place_order(
        &self,
        slug: &str,
        cart: &[CartLine],
        customer: CustomerInfo,
        shipping_address: ShippingAddress,
        customer_notes: Option<String>,
    ) -> Result<Order, EngineError> {
        let reseller = self.published_reseller(slug)?;

        let mut lines = Vec::with_capacity(cart.len());
        for cart_line in cart {
            let binding = self
                .store
                .binding_for(*reseller.id(), cart_line.product_id)?
                .ok_or(DomainError::ProductUnavailable)?;
            let product = self.store.product(binding.product_id())?;
            if !binding.is_active() || !product.is_active() {
                return Err(DomainError::ProductUnavailable.into());
            }

            lines.push(PricedLine {
                product_id: *product.id(),
                product_name: product.name().to_string(),
                product_sku: product.sku().to_string(),
                product_image: product.primary_image().map(str::to_string),
                unit_price: binding.retail_price(),
                base_price: product.base_price(),
                quantity: cart_line.quantity,
            });
        }

        let settlement = settle(&lines, self.config.settlement, self.shipping.as_ref())?;
        let order = Order::place(
            *reseller.id(),
            customer,
            shipping_address,
            settlement,
            customer_notes,
        )?;

        // Stock decrement and order insert are one transaction; a failed
        // line rolls back the whole cart.
        self.store.place_order(&order)?;

        self.publish(
            *order.id().as_uuid(),
            ORDER_ENTITY,
            OrderEvent::OrderPlaced(OrderPlaced {
                order_id: *order.id(),
                reseller_id: *reseller.id(),
                order_number: order.order_number().to_string(),
                total_amount: order.total_amount(),
                reseller_commission: order.reseller_commission(),
                occurred_at: order.created_at(),
            }),
        )?;
        Ok(order)
    }

    /// Move an order along its lifecycle. Admins may move any order; a
    /// reseller only their own.
    #[instrument(skip(self, caller), fields(%order_id, next = next.as_str()), err)]
    pub fn update_order_status(
        &self,
        caller: &Caller,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, EngineError> {
        let mut order = self.store.order(order_id)?;
        self.ensure_order_access(caller, &order)?;

        let from = order.status();
        order.transition_to(next)?;
        self.store.update_order(&order)?;

        self.publish(
            *order.id().as_uuid(),
            ORDER_ENTITY,
            OrderEvent::OrderStatusChanged(OrderStatusChanged {
                order_id,
                reseller_id: order.reseller_id(),
                from,
                to: next,
                occurred_at: order.updated_at(),
            }),
        )?;
        Ok(order)
    }

    /// Record the payment state of an order. Payment collection happens
    /// outside the engine; this only books the outcome.
    #[instrument(skip(self, caller), fields(%order_id, status = status.as_str()), err)]
    pub fn record_payment(
        &self,
        caller: &Caller,
        order_id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, EngineError> {
        caller.ensure_admin()?;
        let mut order = self.store.order(order_id)?;
        order.set_payment_status(status);
        self.store.update_order(&order)?;
        Ok(order)
    }

    /// Attach fulfilment details to an order without moving its status.
    #[instrument(skip_all, fields(%order_id), err)]
    pub fn update_order_fulfilment(
        &self,
        caller: &Caller,
        order_id: OrderId,
        tracking_number: Option<String>,
        tracking_url: Option<String>,
        internal_notes: Option<String>,
    ) -> Result<Order, EngineError> {
        let mut order = self.store.order(order_id)?;
        self.ensure_order_access(caller, &order)?;

        if tracking_number.is_some() || tracking_url.is_some() {
            order.set_tracking(tracking_number, tracking_url);
        }
        if internal_notes.is_some() {
            order.set_internal_notes(internal_notes);
        }
        self.store.update_order(&order)?;
        Ok(order)
    }

    pub fn order(&self, caller: &Caller, order_id: OrderId) -> Result<Order, EngineError> {
        let order = self.store.order(order_id)?;
        self.ensure_order_access(caller, &order)?;
        Ok(order)
    }

    pub fn orders(&self, caller: &Caller) -> Result<Vec<Order>, EngineError> {
        let reseller = self.reseller_of(caller)?;
        Ok(self.store.orders_by_reseller(*reseller.id())?)
    }

    // ---- payouts ----

    /// Request a payout against the caller's available balance.
    ///
    /// `requested = None` draws everything available; a concrete amount is
    /// clamped down to the balance. The balance check and the payout insert
    /// are one transaction scope, serialized per reseller.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id), err)]
    pub fn request_payout(
        &self,
        caller: &Caller,
        requested: Option<Money>,
    ) -> Result<Payout, EngineError> {
        let reseller = self.reseller_of(caller)?;
        let payout =
            self.store
                .create_payout(*reseller.id(), requested, self.config.minimum_payout)?;

        self.publish(
            *payout.id().as_uuid(),
            PAYOUT_ENTITY,
            PayoutEvent::PayoutRequested(PayoutRequested {
                payout_id: *payout.id(),
                reseller_id: *reseller.id(),
                amount: payout.amount(),
                occurred_at: payout.requested_at(),
            }),
        )?;
        Ok(payout)
    }

    #[instrument(skip(self, caller, payment_method), fields(%payout_id), err)]
    pub fn approve_payout(
        &self,
        caller: &Caller,
        payout_id: PayoutId,
        payment_method: Option<String>,
    ) -> Result<Payout, EngineError> {
        self.transition_payout(caller, payout_id, |p| p.approve(payment_method))
    }

    #[instrument(skip(self, caller, payment_reference), fields(%payout_id), err)]
    pub fn complete_payout(
        &self,
        caller: &Caller,
        payout_id: PayoutId,
        payment_reference: Option<String>,
    ) -> Result<Payout, EngineError> {
        self.transition_payout(caller, payout_id, |p| p.complete(payment_reference))
    }

    /// Reject a pending payout; its amount is released back to the balance.
    #[instrument(skip(self, caller, reason), fields(%payout_id), err)]
    pub fn reject_payout(
        &self,
        caller: &Caller,
        payout_id: PayoutId,
        reason: Option<String>,
    ) -> Result<Payout, EngineError> {
        self.transition_payout(caller, payout_id, |p| p.reject(reason))
    }

    pub fn payouts(&self, caller: &Caller) -> Result<Vec<Payout>, EngineError> {
        let reseller = self.reseller_of(caller)?;
        Ok(self.store.payouts_by_reseller(*reseller.id())?)
    }

    /// The caller's derived balance. Never cached; always recomputed from
    /// delivered orders minus non-failed payouts, floored at zero.
    pub fn balance(&self, caller: &Caller) -> Result<BalanceSummary, EngineError> {
        let reseller = self.reseller_of(caller)?;
        Ok(self.store.balance(*reseller.id())?)
    }

    // ---- helpers ----

    fn reseller_of(&self, caller: &Caller) -> Result<Reseller, EngineError> {
        caller.ensure_role(Role::Reseller)?;
        Ok(self.store.reseller_by_user(caller.user_id)?)
    }

    fn manufacturer_of(&self, caller: &Caller) -> Result<Manufacturer, EngineError> {
        caller.ensure_role(Role::Manufacturer)?;
        Ok(self.store.manufacturer_by_user(caller.user_id)?)
    }

    fn owned_product(&self, caller: &Caller, product_id: ProductId) -> Result<Product, EngineError> {
        let manufacturer = self.manufacturer_of(caller)?;
        let product = self.store.product(product_id)?;
        if product.manufacturer_id() != *manufacturer.id() {
            return Err(DomainError::AccessDenied.into());
        }
        Ok(product)
    }

    fn owned_binding(
        &self,
        caller: &Caller,
        binding_id: BindingId,
    ) -> Result<(Reseller, CatalogBinding), EngineError> {
        let reseller = self.reseller_of(caller)?;
        let binding = self.store.binding(binding_id)?;
        if binding.reseller_id() != *reseller.id() {
            return Err(DomainError::AccessDenied.into());
        }
        Ok((reseller, binding))
    }

    fn ensure_order_access(&self, caller: &Caller, order: &Order) -> Result<(), EngineError> {
        caller.ensure_active()?;
        if caller.is_admin() {
            return Ok(());
        }
        let reseller = self.reseller_of(caller)?;
        if order.reseller_id() != *reseller.id() {
            return Err(DomainError::AccessDenied.into());
        }
        Ok(())
    }

    fn transition_payout(
        &self,
        caller: &Caller,
        payout_id: PayoutId,
        f: impl FnOnce(&mut Payout) -> Result<(), DomainError>,
    ) -> Result<Payout, EngineError> {
        caller.ensure_admin()?;
        let mut payout = self.store.payout(payout_id)?;
        let from = payout.status();
        f(&mut payout)?;
        self.store.update_payout(&payout)?;

        self.publish(
            *payout.id().as_uuid(),
            PAYOUT_ENTITY,
            PayoutEvent::PayoutStatusChanged(PayoutStatusChanged {
                payout_id,
                reseller_id: payout.reseller_id(),
                from,
                to: payout.status(),
                occurred_at: payout
                    .completed_at()
                    .or(payout.processed_at())
                    .unwrap_or_else(chrono::Utc::now),
            }),
        )?;
        Ok(payout)
    }

    fn published_reseller(&self, slug: &str) -> Result<Reseller, EngineError> {
        let reseller = self.store.reseller_by_slug(slug)?;
        if !reseller.is_published() {
            return Err(DomainError::StoreNotFound.into());
        }
        Ok(reseller)
    }

    /// The manufacturer's current floor for `product`.
    fn policy_for(&self, product: &Product) -> Result<PricingPolicy, EngineError> {
        let manufacturer = self.store.manufacturer(product.manufacturer_id())?;
        Ok(PricingPolicy::new(manufacturer.minimum_markup_percent()))
    }

    fn publish<E: Event + Serialize>(
        &self,
        entity_id: Uuid,
        entity_type: &str,
        event: E,
    ) -> Result<(), EngineError> {
        let payload =
            serde_json::to_value(&event).map_err(|e| EngineError::Publish(e.to_string()))?;
        self.bus
            .publish(EventEnvelope::new(entity_id, entity_type, payload))
            .map_err(|e| EngineError::Publish(format!("{e:?}")))
    }
}
