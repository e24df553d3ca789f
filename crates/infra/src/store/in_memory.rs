//! In-memory store for tests/dev.
//!
//! One lock guards the whole state, so every `Store` method is naturally a
//! single transaction scope: the check and the write in `place_order` and
//! `create_payout` cannot interleave with another writer.

use std::collections::HashMap;
use std::sync::RwLock;

use vendora_core::{DomainError, Entity, ManufacturerId, Money, ResellerId, UserId};
use vendora_catalog::{BindingId, CatalogBinding, Product, ProductId};
use vendora_orders::{Order, OrderId};
use vendora_parties::{Manufacturer, Reseller};
use vendora_payouts::{BalanceSummary, Payout, PayoutId, ledger};

use super::{Store, StoreError};

#[derive(Debug, Default)]
struct State {
    resellers: HashMap<ResellerId, Reseller>,
    manufacturers: HashMap<ManufacturerId, Manufacturer>,
    products: HashMap<ProductId, Product>,
    bindings: HashMap<BindingId, CatalogBinding>,
    orders: HashMap<OrderId, Order>,
    payouts: HashMap<PayoutId, Payout>,
}

/// In-memory `Store` implementation. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::backend("read", "lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::backend("write", "lock poisoned"))
    }
}

fn balance_of(state: &State, reseller_id: ResellerId) -> BalanceSummary {
    ledger::summarize(
        state.orders.values().filter(|o| o.reseller_id() == reseller_id),
        state.payouts.values().filter(|p| p.reseller_id() == reseller_id),
    )
}

impl Store for InMemoryStore {
    fn insert_reseller(&self, reseller: Reseller) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.resellers.values().any(|r| r.slug() == reseller.slug()) {
            return Err(DomainError::validation("store slug is already taken").into());
        }
        state.resellers.insert(*reseller.id(), reseller);
        Ok(())
    }

    fn update_reseller(&self, reseller: &Reseller) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.resellers.contains_key(reseller.id()) {
            return Err(DomainError::not_found("reseller").into());
        }
        state.resellers.insert(*reseller.id(), reseller.clone());
        Ok(())
    }

    fn reseller(&self, id: ResellerId) -> Result<Reseller, StoreError> {
        self.read()?
            .resellers
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("reseller").into())
    }

    fn reseller_by_user(&self, user_id: UserId) -> Result<Reseller, StoreError> {
        self.read()?
            .resellers
            .values()
            .find(|r| r.user_id() == user_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("reseller").into())
    }

    fn reseller_by_slug(&self, slug: &str) -> Result<Reseller, StoreError> {
        self.read()?
            .resellers
            .values()
            .find(|r| r.slug() == slug)
            .cloned()
            .ok_or(StoreError::Domain(DomainError::StoreNotFound))
    }

    fn insert_manufacturer(&self, manufacturer: Manufacturer) -> Result<(), StoreError> {
        self.write()?
            .manufacturers
            .insert(*manufacturer.id(), manufacturer);
        Ok(())
    }

    fn update_manufacturer(&self, manufacturer: &Manufacturer) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.manufacturers.contains_key(manufacturer.id()) {
            return Err(DomainError::not_found("manufacturer").into());
        }
        state
            .manufacturers
            .insert(*manufacturer.id(), manufacturer.clone());
        Ok(())
    }

    fn manufacturer(&self, id: ManufacturerId) -> Result<Manufacturer, StoreError> {
        self.read()?
            .manufacturers
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("manufacturer").into())
    }

    fn manufacturer_by_user(&self, user_id: UserId) -> Result<Manufacturer, StoreError> {
        self.read()?
            .manufacturers
            .values()
            .find(|m| m.user_id() == user_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("manufacturer").into())
    }

    fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        self.write()?.products.insert(*product.id(), product);
        Ok(())
    }

    fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.products.contains_key(product.id()) {
            return Err(DomainError::not_found("product").into());
        }
        state.products.insert(*product.id(), product.clone());
        Ok(())
    }

    fn product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    fn products_by_manufacturer(&self, id: ManufacturerId) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.manufacturer_id() == id)
            .cloned()
            .collect())
    }

    fn insert_binding(&self, binding: CatalogBinding) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let duplicate = state.bindings.values().any(|b| {
            b.reseller_id() == binding.reseller_id() && b.product_id() == binding.product_id()
        });
        if duplicate {
            return Err(DomainError::DuplicateBinding.into());
        }
        state.bindings.insert(*binding.id(), binding);
        Ok(())
    }

    fn update_binding(&self, binding: &CatalogBinding) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.bindings.contains_key(binding.id()) {
            return Err(DomainError::not_found("listing").into());
        }
        state.bindings.insert(*binding.id(), binding.clone());
        Ok(())
    }

    fn delete_binding(&self, id: BindingId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .bindings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("listing").into())
    }

    fn binding(&self, id: BindingId) -> Result<CatalogBinding, StoreError> {
        self.read()?
            .bindings
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("listing").into())
    }

    fn binding_for(
        &self,
        reseller_id: ResellerId,
        product_id: ProductId,
    ) -> Result<Option<CatalogBinding>, StoreError> {
        Ok(self
            .read()?
            .bindings
            .values()
            .find(|b| b.reseller_id() == reseller_id && b.product_id() == product_id)
            .cloned())
    }

    fn bindings_by_reseller(&self, id: ResellerId) -> Result<Vec<CatalogBinding>, StoreError> {
        let mut bindings: Vec<CatalogBinding> = self
            .read()?
            .bindings
            .values()
            .filter(|b| b.reseller_id() == id)
            .cloned()
            .collect();
        bindings.sort_by_key(|b| (b.display_order(), *b.id().as_uuid()));
        Ok(bindings)
    }

    fn place_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.write()?;

        // Lines for the same product draw on the same stock, so validate
        // the per-product totals before touching anything. A late failure
        // must never leave a partial decrement behind.
        let mut totals: HashMap<ProductId, i64> = HashMap::new();
        for item in order.items() {
            *totals.entry(item.product_id).or_insert(0) += item.quantity;
        }

        for (product_id, quantity) in &totals {
            let product = state
                .products
                .get(product_id)
                .ok_or_else(|| StoreError::from(DomainError::not_found("product")))?;
            product.ensure_available(*quantity)?;
        }

        for (product_id, quantity) in &totals {
            // Looked up above; the lock is still held.
            if let Some(product) = state.products.get_mut(product_id) {
                product.decrement_stock(*quantity)?;
            }
        }

        state.orders.insert(*order.id(), order.clone());
        Ok(())
    }

    fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.orders.contains_key(order.id()) {
            return Err(DomainError::not_found("order").into());
        }
        state.orders.insert(*order.id(), order.clone());
        Ok(())
    }

    fn order(&self, id: OrderId) -> Result<Order, StoreError> {
        self.read()?
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("order").into())
    }

    fn orders_by_reseller(&self, id: ResellerId) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.reseller_id() == id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at());
        Ok(orders)
    }

    fn create_payout(
        &self,
        reseller_id: ResellerId,
        requested: Option<Money>,
        minimum: Money,
    ) -> Result<Payout, StoreError> {
        let mut state = self.write()?;

        let summary = balance_of(&state, reseller_id);
        let amount = ledger::resolve_request(&summary, requested, minimum)?;

        let payout = Payout::request(reseller_id, amount)?;
        state.payouts.insert(*payout.id(), payout.clone());
        Ok(payout)
    }

    fn update_payout(&self, payout: &Payout) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.payouts.contains_key(payout.id()) {
            return Err(DomainError::not_found("payout").into());
        }
        state.payouts.insert(*payout.id(), payout.clone());
        Ok(())
    }

    fn payout(&self, id: PayoutId) -> Result<Payout, StoreError> {
        self.read()?
            .payouts
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("payout").into())
    }

    fn payouts_by_reseller(&self, id: ResellerId) -> Result<Vec<Payout>, StoreError> {
        let mut payouts: Vec<Payout> = self
            .read()?
            .payouts
            .values()
            .filter(|p| p.reseller_id() == id)
            .cloned()
            .collect();
        payouts.sort_by_key(|p| p.requested_at());
        Ok(payouts)
    }

    fn balance(&self, reseller_id: ResellerId) -> Result<BalanceSummary, StoreError> {
        let state = self.read()?;
        Ok(balance_of(&state, reseller_id))
    }
}
