use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{Money, ResellerId};
use vendora_events::Event;

use crate::payout::{PayoutId, PayoutStatus};

/// Notification: a payout row was opened and its amount locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequested {
    pub payout_id: PayoutId,
    pub reseller_id: ResellerId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Notification: an admin moved a payout along its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutStatusChanged {
    pub payout_id: PayoutId,
    pub reseller_id: ResellerId,
    pub from: PayoutStatus,
    pub to: PayoutStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayoutEvent {
    PayoutRequested(PayoutRequested),
    PayoutStatusChanged(PayoutStatusChanged),
}

impl Event for PayoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PayoutEvent::PayoutRequested(_) => "payouts.payout.requested",
            PayoutEvent::PayoutStatusChanged(_) => "payouts.payout.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PayoutEvent::PayoutRequested(e) => e.occurred_at,
            PayoutEvent::PayoutStatusChanged(e) => e.occurred_at,
        }
    }
}
