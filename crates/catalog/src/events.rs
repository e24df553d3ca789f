use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{Money, ResellerId};
use vendora_events::Event;

use crate::binding::BindingId;
use crate::product::ProductId;

/// Notification: a product was listed in a storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingCreated {
    pub binding_id: BindingId,
    pub reseller_id: ResellerId,
    pub product_id: ProductId,
    pub retail_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Notification: a listing's retail price changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingRepriced {
    pub binding_id: BindingId,
    pub reseller_id: ResellerId,
    pub old_price: Money,
    pub new_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Notification: a listing was removed from a storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingRemoved {
    pub binding_id: BindingId,
    pub reseller_id: ResellerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogEvent {
    BindingCreated(BindingCreated),
    BindingRepriced(BindingRepriced),
    BindingRemoved(BindingRemoved),
}

impl Event for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::BindingCreated(_) => "catalog.binding.created",
            CatalogEvent::BindingRepriced(_) => "catalog.binding.repriced",
            CatalogEvent::BindingRemoved(_) => "catalog.binding.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::BindingCreated(e) => e.occurred_at,
            CatalogEvent::BindingRepriced(e) => e.occurred_at,
            CatalogEvent::BindingRemoved(e) => e.occurred_at,
        }
    }
}
