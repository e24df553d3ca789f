//! Marker for values compared by content.

/// A value with no identity of its own.
///
/// `Money` and `PricingPolicy` are value objects: equal when their fields
/// are equal, replaced rather than mutated. Entities hold them; they never
/// hold entities.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
