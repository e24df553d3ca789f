use crate::EventEnvelope;

/// A projection builds a read model from a stream of notifications.
///
/// Projections transform committed-state notifications into queryable views
/// (dashboard stats, denormalized listings). The store remains the source of
/// truth; a read model can be discarded and rebuilt at any time by replaying
/// notifications or re-deriving from the store.
///
/// ## Idempotency
///
/// Delivery is at-least-once, so `apply` must be idempotent: dedup on
/// `event_id`, or use naturally idempotent updates (upserts, set operations).
pub trait Projection {
    /// The payload type consumed, typically a domain event enum or a
    /// serialized `serde_json::Value` when fed from a mixed stream.
    type Ev;

    /// Apply a single notification to the projection, updating the read model.
    ///
    /// Does not return errors: irrelevant events are ignored, and a failure to
    /// apply should be logged and skipped rather than halting the consumer.
    fn apply(&self, envelope: &EventEnvelope<Self::Ev>);
}
