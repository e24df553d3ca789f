//! `vendora-catalog` — manufacturer products and reseller listings.
//!
//! A [`Product`] belongs to exactly one manufacturer and carries the base
//! price and stock. A [`CatalogBinding`] is a reseller's listing of that
//! product at a retail price; the binding is where the pricing floor is
//! enforced and where storefront visibility is decided.

pub mod binding;
pub mod events;
pub mod product;

pub use binding::{BindingId, BindingUpdate, CatalogBinding, NewBinding};
pub use events::{BindingCreated, BindingRemoved, BindingRepriced, CatalogEvent};
pub use product::{Product, ProductId, ProductUpdate};
