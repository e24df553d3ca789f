//! Identity marker for domain records.

/// A domain record with a stable identity.
///
/// Two entities are the same thing when their ids match, however far the
/// rest of their state has drifted. Stores key persistence on `id()`.
pub trait Entity {
    /// The id newtype for this entity.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
