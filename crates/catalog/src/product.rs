use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_core::{DomainError, DomainResult, Entity, ManufacturerId, Money};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
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

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ProductId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ProductId> for Uuid {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

/// Partial update of a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub description: Option<Option<String>>,
    pub msrp: Option<Option<Money>>,
    pub primary_image: Option<Option<String>>,
    pub low_stock_threshold: Option<i64>,
    pub track_inventory: Option<bool>,
}

/// A manufacturer's product: the shared catalog entry resellers list.
///
/// `base_price` is what the manufacturer earns per unit; resellers retail
/// above it. Stock is authoritative here, across all storefronts, and only
/// enforced when `track_inventory` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    manufacturer_id: ManufacturerId,
    sku: String,
    name: String,
    description: Option<String>,
    base_price: Money,
    msrp: Option<Money>,
    primary_image: Option<String>,
    stock_quantity: i64,
    low_stock_threshold: i64,
    track_inventory: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        manufacturer_id: ManufacturerId,
        sku: impl Into<String>,
        name: impl Into<String>,
        base_price: Money,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();

        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if base_price.is_negative() {
            return Err(DomainError::validation("base price cannot be negative"));
        }

        Ok(Self {
            id: ProductId::new(),
            manufacturer_id,
            sku,
            name,
            description: None,
            base_price,
            msrp: None,
            primary_image: None,
            stock_quantity: 0,
            low_stock_threshold: 5,
            track_inventory: true,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    pub fn manufacturer_id(&self) -> ManufacturerId {
        self.manufacturer_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn msrp(&self) -> Option<Money> {
        self.msrp
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.primary_image.as_deref()
    }

    pub fn stock_quantity(&self) -> i64 {
        self.stock_quantity
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    pub fn track_inventory(&self) -> bool {
        self.track_inventory
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_base_price(&mut self, base_price: Money) -> DomainResult<()> {
        if base_price.is_negative() {
            return Err(DomainError::validation("base price cannot be negative"));
        }
        self.base_price = base_price;
        Ok(())
    }

    pub fn set_msrp(&mut self, msrp: Option<Money>) {
        self.msrp = msrp;
    }

    pub fn set_primary_image(&mut self, url: Option<String>) {
        self.primary_image = url;
    }

    pub fn set_low_stock_threshold(&mut self, threshold: i64) {
        self.low_stock_threshold = threshold.max(0);
    }

    /// Apply a partial update. Price and activation have their own paths
    /// since they feed the floor check and storefront visibility.
    pub fn apply_update(&mut self, update: ProductUpdate) {
        if let Some(description) = update.description {
            self.set_description(description);
        }
        if let Some(msrp) = update.msrp {
            self.set_msrp(msrp);
        }
        if let Some(image) = update.primary_image {
            self.set_primary_image(image);
        }
        if let Some(threshold) = update.low_stock_threshold {
            self.set_low_stock_threshold(threshold);
        }
        if let Some(track) = update.track_inventory {
            self.set_track_inventory(track);
        }
    }

    pub fn set_track_inventory(&mut self, track: bool) {
        self.track_inventory = track;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// In stock from a buyer's perspective. Untracked products never run out.
    pub fn is_in_stock(&self) -> bool {
        !self.track_inventory || self.stock_quantity > 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.track_inventory && self.stock_quantity <= self.low_stock_threshold
    }

    /// Check the product can satisfy a purchase of `quantity` units.
    pub fn ensure_available(&self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if !self.is_active {
            return Err(DomainError::ProductUnavailable);
        }
        if self.track_inventory && self.stock_quantity < quantity {
            return Err(DomainError::InsufficientStock {
                available: self.stock_quantity,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Take `quantity` units out of stock. No-op for untracked products.
    ///
    /// The check-and-decrement must be atomic with respect to concurrent
    /// orders; callers run this inside the store's transaction scope.
    pub fn decrement_stock(&mut self, quantity: i64) -> DomainResult<()> {
        self.ensure_available(quantity)?;
        if self.track_inventory {
            self.stock_quantity -= quantity;
        }
        Ok(())
    }

    pub fn restock(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("restock quantity must be positive"));
        }
        self.stock_quantity += quantity;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let mut p = Product::new(
            ManufacturerId::new(),
            "SKU-001",
            "Forge Anvil",
            Money::from_major(1000),
        )
        .unwrap();
        p.restock(5).unwrap();
        p
    }

    #[test]
    fn oversell_is_rejected_with_availability() {
        let mut p = product();
        let err = p.decrement_stock(6).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 5,
                requested: 6
            }
        );
        assert_eq!(p.stock_quantity(), 5);
    }

    #[test]
    fn exact_stock_sells_out() {
        let mut p = product();
        p.decrement_stock(5).unwrap();
        assert_eq!(p.stock_quantity(), 0);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn untracked_products_never_deplete() {
        let mut p = product();
        p.set_track_inventory(false);
        p.decrement_stock(1_000).unwrap();
        assert_eq!(p.stock_quantity(), 5);
        assert!(p.is_in_stock());
    }

    #[test]
    fn inactive_products_cannot_be_bought() {
        let mut p = product();
        p.deactivate();
        assert_eq!(p.ensure_available(1), Err(DomainError::ProductUnavailable));
    }

    #[test]
    fn low_stock_tracks_threshold() {
        let mut p = product();
        assert!(p.is_low_stock()); // 5 units at the default threshold of 5
        p.set_low_stock_threshold(2);
        assert!(!p.is_low_stock());
    }
}
