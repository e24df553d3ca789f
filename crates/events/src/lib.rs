//! Event plumbing: notification contracts + pub/sub mechanics.
//!
//! Business operations commit state first, then publish a notification here.
//! The bus is for distribution only; the store remains the source of truth, so
//! a lost notification never loses business state.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod projection;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use projection::Projection;
