//! `vendora-parties` — the two seller-side parties of the marketplace.
//!
//! A [`Manufacturer`] owns the catalog and sets the pricing floor; a
//! [`Reseller`] runs a white-label storefront over that catalog. Pure domain,
//! no storage concerns.

pub mod manufacturer;
pub mod reseller;

pub use manufacturer::Manufacturer;
pub use reseller::Reseller;
