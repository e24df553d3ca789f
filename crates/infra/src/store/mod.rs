//! The transactional storage boundary.
//!
//! Every atomic business operation is one method on [`Store`]; backends run
//! the check and the write inside a single transaction scope. Two backends
//! are provided: [`InMemoryStore`] for tests/dev and [`PostgresStore`] for
//! production.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

use std::sync::Arc;

use thiserror::Error;

use vendora_core::{DomainError, ManufacturerId, Money, ResellerId, UserId};
use vendora_catalog::{BindingId, CatalogBinding, Product, ProductId};
use vendora_orders::{Order, OrderId};
use vendora_parties::{Manufacturer, Reseller};
use vendora_payouts::{BalanceSummary, Payout, PayoutId};

/// Store operation error.
///
/// `Domain` carries deterministic business failures detected inside the
/// transaction scope (insufficient stock, duplicate binding, no balance);
/// `Backend` is infrastructure trouble (connection loss, serialization).
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error in {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl StoreError {
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

}

/// Storage contract for the settlement engine.
///
/// Plain reads and writes are row-level; the two business-atomic operations
/// are [`Store::place_order`] (stock check-and-decrement plus order insert in
/// one scope) and [`Store::create_payout`] (balance derivation plus payout
/// insert, serialized per reseller).
pub trait Store: Send + Sync {
    // ── parties ──────────────────────────────────────────────────────────

    fn insert_reseller(&self, reseller: Reseller) -> Result<(), StoreError>;
    fn update_reseller(&self, reseller: &Reseller) -> Result<(), StoreError>;
    fn reseller(&self, id: ResellerId) -> Result<Reseller, StoreError>;
    fn reseller_by_user(&self, user_id: UserId) -> Result<Reseller, StoreError>;
    /// Lookup by storefront slug. `StoreNotFound` when no reseller owns it.
    fn reseller_by_slug(&self, slug: &str) -> Result<Reseller, StoreError>;

    fn insert_manufacturer(&self, manufacturer: Manufacturer) -> Result<(), StoreError>;
    fn update_manufacturer(&self, manufacturer: &Manufacturer) -> Result<(), StoreError>;
    fn manufacturer(&self, id: ManufacturerId) -> Result<Manufacturer, StoreError>;
    fn manufacturer_by_user(&self, user_id: UserId) -> Result<Manufacturer, StoreError>;

    // ── catalog ──────────────────────────────────────────────────────────

    fn insert_product(&self, product: Product) -> Result<(), StoreError>;
    fn update_product(&self, product: &Product) -> Result<(), StoreError>;
    fn product(&self, id: ProductId) -> Result<Product, StoreError>;
    fn products_by_manufacturer(&self, id: ManufacturerId) -> Result<Vec<Product>, StoreError>;

    /// One binding per (reseller, product); a second insert reports
    /// `DuplicateBinding`.
    fn insert_binding(&self, binding: CatalogBinding) -> Result<(), StoreError>;
    fn update_binding(&self, binding: &CatalogBinding) -> Result<(), StoreError>;
    fn delete_binding(&self, id: BindingId) -> Result<(), StoreError>;
    fn binding(&self, id: BindingId) -> Result<CatalogBinding, StoreError>;
    fn binding_for(
        &self,
        reseller_id: ResellerId,
        product_id: ProductId,
    ) -> Result<Option<CatalogBinding>, StoreError>;
    fn bindings_by_reseller(&self, id: ResellerId) -> Result<Vec<CatalogBinding>, StoreError>;

    // ── orders ───────────────────────────────────────────────────────────

    /// Persist a placed order and decrement stock for every tracked line,
    /// atomically. If any line cannot be covered the whole operation fails
    /// with `InsufficientStock` and no stock moves.
    fn place_order(&self, order: &Order) -> Result<(), StoreError>;
    fn update_order(&self, order: &Order) -> Result<(), StoreError>;
    fn order(&self, id: OrderId) -> Result<Order, StoreError>;
    fn orders_by_reseller(&self, id: ResellerId) -> Result<Vec<Order>, StoreError>;

    // ── payouts ──────────────────────────────────────────────────────────

    /// Derive the balance, resolve the requested amount, and open the payout
    /// row in one serialized scope per reseller. Concurrent requests for the
    /// same reseller cannot both draw on the same commission.
    fn create_payout(
        &self,
        reseller_id: ResellerId,
        requested: Option<Money>,
        minimum: Money,
    ) -> Result<Payout, StoreError>;
    fn update_payout(&self, payout: &Payout) -> Result<(), StoreError>;
    fn payout(&self, id: PayoutId) -> Result<Payout, StoreError>;
    fn payouts_by_reseller(&self, id: ResellerId) -> Result<Vec<Payout>, StoreError>;

    /// Derive the commission position in full; never cached.
    fn balance(&self, reseller_id: ResellerId) -> Result<BalanceSummary, StoreError>;
}

impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    fn insert_reseller(&self, reseller: Reseller) -> Result<(), StoreError> {
        (**self).insert_reseller(reseller)
    }

    fn update_reseller(&self, reseller: &Reseller) -> Result<(), StoreError> {
        (**self).update_reseller(reseller)
    }

    fn reseller(&self, id: ResellerId) -> Result<Reseller, StoreError> {
        (**self).reseller(id)
    }

    fn reseller_by_user(&self, user_id: UserId) -> Result<Reseller, StoreError> {
        (**self).reseller_by_user(user_id)
    }

    fn reseller_by_slug(&self, slug: &str) -> Result<Reseller, StoreError> {
        (**self).reseller_by_slug(slug)
    }

    fn insert_manufacturer(&self, manufacturer: Manufacturer) -> Result<(), StoreError> {
        (**self).insert_manufacturer(manufacturer)
    }

    fn update_manufacturer(&self, manufacturer: &Manufacturer) -> Result<(), StoreError> {
        (**self).update_manufacturer(manufacturer)
    }

    fn manufacturer(&self, id: ManufacturerId) -> Result<Manufacturer, StoreError> {
        (**self).manufacturer(id)
    }

    fn manufacturer_by_user(&self, user_id: UserId) -> Result<Manufacturer, StoreError> {
        (**self).manufacturer_by_user(user_id)
    }

    fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        (**self).insert_product(product)
    }

    fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        (**self).update_product(product)
    }

    fn product(&self, id: ProductId) -> Result<Product, StoreError> {
        (**self).product(id)
    }

    fn products_by_manufacturer(&self, id: ManufacturerId) -> Result<Vec<Product>, StoreError> {
        (**self).products_by_manufacturer(id)
    }

    fn insert_binding(&self, binding: CatalogBinding) -> Result<(), StoreError> {
        (**self).insert_binding(binding)
    }

    fn update_binding(&self, binding: &CatalogBinding) -> Result<(), StoreError> {
        (**self).update_binding(binding)
    }

    fn delete_binding(&self, id: BindingId) -> Result<(), StoreError> {
        (**self).delete_binding(id)
    }

    fn binding(&self, id: BindingId) -> Result<CatalogBinding, StoreError> {
        (**self).binding(id)
    }

    fn binding_for(
        &self,
        reseller_id: ResellerId,
        product_id: ProductId,
    ) -> Result<Option<CatalogBinding>, StoreError> {
        (**self).binding_for(reseller_id, product_id)
    }

    fn bindings_by_reseller(&self, id: ResellerId) -> Result<Vec<CatalogBinding>, StoreError> {
        (**self).bindings_by_reseller(id)
    }

    fn place_order(&self, order: &Order) -> Result<(), StoreError> {
        (**self).place_order(order)
    }

    fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        (**self).update_order(order)
    }

    fn order(&self, id: OrderId) -> Result<Order, StoreError> {
        (**self).order(id)
    }

    fn orders_by_reseller(&self, id: ResellerId) -> Result<Vec<Order>, StoreError> {
        (**self).orders_by_reseller(id)
    }

    fn create_payout(
        &self,
        reseller_id: ResellerId,
        requested: Option<Money>,
        minimum: Money,
    ) -> Result<Payout, StoreError> {
        (**self).create_payout(reseller_id, requested, minimum)
    }

    fn update_payout(&self, payout: &Payout) -> Result<(), StoreError> {
        (**self).update_payout(payout)
    }

    fn payout(&self, id: PayoutId) -> Result<Payout, StoreError> {
        (**self).payout(id)
    }

    fn payouts_by_reseller(&self, id: ResellerId) -> Result<Vec<Payout>, StoreError> {
        (**self).payouts_by_reseller(id)
    }

    fn balance(&self, reseller_id: ResellerId) -> Result<BalanceSummary, StoreError> {
        (**self).balance(reseller_id)
    }
}
