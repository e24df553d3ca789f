use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a published notification.
///
/// This is the unit handed to the bus after a business operation commits.
/// The envelope carries routing metadata; `payload` is the domain event.
///
/// Unlike an event-sourced stream there is no sequence number here: the store
/// is the source of truth and notifications are advisory, so consumers key on
/// `event_id` for dedup rather than on stream position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    entity_id: Uuid,
    entity_type: String,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(entity_id: Uuid, entity_type: impl Into<String>, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            entity_id,
            entity_type: entity_type.into(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
