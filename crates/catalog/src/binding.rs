use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_core::{DomainError, DomainResult, Entity, Money, ResellerId};
use vendora_pricing::PricingPolicy;

use crate::product::{Product, ProductId};

/// Catalog binding identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingId(Uuid);

impl BindingId {
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

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for BindingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for BindingId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<BindingId> for Uuid {
    fn from(value: BindingId) -> Self {
        value.0
    }
}

/// Input for listing a product in a storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBinding {
    pub retail_price: Money,
    pub compare_at_price: Option<Money>,
    pub custom_title: Option<String>,
    pub custom_description: Option<String>,
    pub is_featured: bool,
    pub display_order: i32,
}

impl NewBinding {
    pub fn at_price(retail_price: Money) -> Self {
        Self {
            retail_price,
            compare_at_price: None,
            custom_title: None,
            custom_description: None,
            is_featured: false,
            display_order: 0,
        }
    }
}

/// Partial update of a binding. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingUpdate {
    pub retail_price: Option<Money>,
    pub compare_at_price: Option<Option<Money>>,
    pub custom_title: Option<Option<String>>,
    pub custom_description: Option<Option<String>>,
    pub is_featured: Option<bool>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// A reseller's listing of one product at a retail price.
///
/// One binding per (reseller, product) pair; duplicates are a conflict. The
/// pricing floor is checked whenever the retail price is set, against the
/// product's base price and the manufacturer's floor *at that moment*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBinding {
    id: BindingId,
    reseller_id: ResellerId,
    product_id: ProductId,
    retail_price: Money,
    compare_at_price: Option<Money>,
    custom_title: Option<String>,
    custom_description: Option<String>,
    is_featured: bool,
    display_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CatalogBinding {
    /// List `product` in the reseller's storefront.
    ///
    /// Fails if the product is inactive or the price is under the floor.
    pub fn create(
        reseller_id: ResellerId,
        product: &Product,
        policy: PricingPolicy,
        new: NewBinding,
    ) -> DomainResult<Self> {
        if !product.is_active() {
            return Err(DomainError::ProductUnavailable);
        }
        policy.validate_price(product.base_price(), new.retail_price)?;

        let now = Utc::now();
        Ok(Self {
            id: BindingId::new(),
            reseller_id,
            product_id: *product.id(),
            retail_price: new.retail_price,
            compare_at_price: new.compare_at_price,
            custom_title: new.custom_title,
            custom_description: new.custom_description,
            is_featured: new.is_featured,
            display_order: new.display_order,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn reseller_id(&self) -> ResellerId {
        self.reseller_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn retail_price(&self) -> Money {
        self.retail_price
    }

    pub fn compare_at_price(&self) -> Option<Money> {
        self.compare_at_price
    }

    pub fn custom_title(&self) -> Option<&str> {
        self.custom_title.as_deref()
    }

    pub fn custom_description(&self) -> Option<&str> {
        self.custom_description.as_deref()
    }

    pub fn is_featured(&self) -> bool {
        self.is_featured
    }

    pub fn display_order(&self) -> i32 {
        self.display_order
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Title shown on the storefront: the reseller's override, or the
    /// product name.
    pub fn display_title<'a>(&'a self, product: &'a Product) -> &'a str {
        self.custom_title.as_deref().unwrap_or(product.name())
    }

    /// Apply a partial update. A price change is revalidated against the
    /// floor as it stands now.
    pub fn apply_update(
        &mut self,
        product: &Product,
        policy: PricingPolicy,
        update: BindingUpdate,
    ) -> DomainResult<()> {
        if let Some(price) = update.retail_price {
            policy.validate_price(product.base_price(), price)?;
            self.retail_price = price;
        }
        if let Some(compare_at) = update.compare_at_price {
            self.compare_at_price = compare_at;
        }
        if let Some(title) = update.custom_title {
            self.custom_title = title;
        }
        if let Some(description) = update.custom_description {
            self.custom_description = description;
        }
        if let Some(featured) = update.is_featured {
            self.is_featured = featured;
        }
        if let Some(order) = update.display_order {
            self.display_order = order;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Set the retail price to `base * (1 + markup%)`, rounded to two
    /// decimal places. Used by bulk repricing; a result under the floor
    /// leaves the binding untouched and reports the floor.
    pub fn reprice_with_markup(
        &mut self,
        product: &Product,
        policy: PricingPolicy,
        markup_percent: Decimal,
    ) -> DomainResult<Money> {
        let new_price = product.base_price().apply_markup(markup_percent).rounded();
        policy.validate_price(product.base_price(), new_price)?;
        self.retail_price = new_price;
        self.updated_at = Utc::now();
        Ok(new_price)
    }

    /// Per-unit reseller margin for this listing.
    pub fn margin(&self, product: &Product) -> Money {
        vendora_pricing::margin(product.base_price(), self.retail_price)
    }

    /// Margin as a percentage of base; zero when base is not positive.
    pub fn margin_percent(&self, product: &Product) -> Decimal {
        vendora_pricing::margin_percent(product.base_price(), self.retail_price)
    }

    /// Whether this listing appears on the public storefront.
    ///
    /// Requires the binding active, the product active, and stock on hand
    /// (untracked products always count as in stock). Management views do
    /// not apply this filter.
    pub fn storefront_visible(&self, product: &Product) -> bool {
        self.is_active && product.is_active() && product.is_in_stock()
    }
}

impl Entity for CatalogBinding {
    type Id = BindingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
