//! Reseller dashboard projection.
//!
//! Tracks per-reseller sales activity derived from order and payout
//! notifications: an order board (one summary row per order) plus rolled-up
//! stats for the dashboard header.
//!
//! Notifications carry no sequence numbers, so idempotency is keyed on the
//! envelope `event_id`. The stored summaries let later lifecycle events
//! resolve amounts their payloads do not carry (commission on delivery,
//! payout amount on completion).

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use vendora_core::{Money, ResellerId};
use vendora_events::{EventEnvelope, Projection};
use vendora_orders::{OrderEvent, OrderId, OrderStatus};
use vendora_payouts::{PayoutEvent, PayoutStatus};

use crate::read_model::OwnerStore;

/// Envelope entity types this projection consumes.
const ORDER_ENTITY: &str = "orders.order";
const PAYOUT_ENTITY: &str = "payouts.payout";

/// Read model: one row per order on the reseller's board.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub reseller_commission: Money,
}

/// Read model: rolled-up dashboard numbers for one reseller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResellerStats {
    pub reseller_id: ResellerId,
    pub orders_placed: u64,
    pub orders_delivered: u64,
    /// Sum of order totals at placement.
    pub gross_revenue: Money,
    /// Commission across delivered orders only.
    pub commission_earned: Money,
    pub payouts_requested: u64,
    /// Sum of completed payout amounts.
    pub amount_paid_out: Money,
}

impl ResellerStats {
    fn new(reseller_id: ResellerId) -> Self {
        Self {
            reseller_id,
            orders_placed: 0,
            orders_delivered: 0,
            gross_revenue: Money::ZERO,
            commission_earned: Money::ZERO,
            payouts_requested: 0,
            amount_paid_out: Money::ZERO,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResellerStatsError {
    #[error("failed to deserialize {entity_type} event: {message}")]
    Deserialize {
        entity_type: String,
        message: String,
    },
}

/// Reseller stats projection: order board plus dashboard roll-ups.
///
/// Rebuildable from the notification stream. Reseller-isolated.
#[derive(Debug)]
pub struct ResellerStatsProjection<S>
where
    S: OwnerStore<OrderId, OrderSummary>,
{
    store: S,
    stats: RwLock<HashMap<ResellerId, ResellerStats>>,
    /// Payout amounts by payout id, for resolving completion events.
    payout_amounts: RwLock<HashMap<Uuid, (ResellerId, Money)>>,
    seen: RwLock<HashSet<Uuid>>,
}

impl<S> ResellerStatsProjection<S>
where
    S: OwnerStore<OrderId, OrderSummary>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            stats: RwLock::new(HashMap::new()),
            payout_amounts: RwLock::new(HashMap::new()),
            seen: RwLock::new(HashSet::new()),
        }
    }

    /// Dashboard numbers for a reseller, if any activity has been seen.
    pub fn stats(&self, reseller_id: ResellerId) -> Option<ResellerStats> {
        self.stats.read().ok()?.get(&reseller_id).cloned()
    }

    /// The reseller's order board.
    pub fn orders(&self, reseller_id: ResellerId) -> Vec<OrderSummary> {
        self.store.list(reseller_id)
    }

    fn update_stats(&self, reseller_id: ResellerId, f: impl FnOnce(&mut ResellerStats)) {
        if let Ok(mut stats) = self.stats.write() {
            f(stats
                .entry(reseller_id)
                .or_insert_with(|| ResellerStats::new(reseller_id)));
        }
    }

    /// Apply one notification envelope.
    ///
    /// Envelopes with an unknown entity type and duplicate deliveries are
    /// ignored; the dedup mark is only set once the event applied cleanly so
    /// a failed delivery can be retried.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ResellerStatsError> {
        let already_seen = self
            .seen
            .read()
            .map(|s| s.contains(&envelope.event_id()))
            .unwrap_or(false);
        if already_seen {
            return Ok(());
        }

        match envelope.entity_type() {
            ORDER_ENTITY => self.apply_order(decode(envelope)?),
            PAYOUT_ENTITY => self.apply_payout(decode(envelope)?),
            _ => return Ok(()),
        }

        if let Ok(mut seen) = self.seen.write() {
            seen.insert(envelope.event_id());
        }
        Ok(())
    }

    fn apply_order(&self, ev: OrderEvent) {
        match ev {
            OrderEvent::OrderPlaced(e) => {
                self.store.upsert(
                    e.reseller_id,
                    e.order_id,
                    OrderSummary {
                        order_id: e.order_id,
                        order_number: e.order_number,
                        status: OrderStatus::Pending,
                        total_amount: e.total_amount,
                        reseller_commission: e.reseller_commission,
                    },
                );
                self.update_stats(e.reseller_id, |s| {
                    s.orders_placed += 1;
                    s.gross_revenue += e.total_amount;
                });
            }
            OrderEvent::OrderStatusChanged(e) => {
                let Some(mut summary) = self.store.get(e.reseller_id, &e.order_id) else {
                    // Board row never arrived; nothing to roll up against.
                    return;
                };
                summary.status = e.to;
                let commission = summary.reseller_commission;
                self.store.upsert(e.reseller_id, e.order_id, summary);

                if e.to == OrderStatus::Delivered {
                    self.update_stats(e.reseller_id, |s| {
                        s.orders_delivered += 1;
                        s.commission_earned += commission;
                    });
                }
            }
        }
    }

    fn apply_payout(&self, ev: PayoutEvent) {
        match ev {
            PayoutEvent::PayoutRequested(e) => {
                if let Ok(mut amounts) = self.payout_amounts.write() {
                    amounts.insert(*e.payout_id.as_uuid(), (e.reseller_id, e.amount));
                }
                self.update_stats(e.reseller_id, |s| s.payouts_requested += 1);
            }
            PayoutEvent::PayoutStatusChanged(e) => {
                if e.to != PayoutStatus::Completed {
                    return;
                }
                let amount = self
                    .payout_amounts
                    .read()
                    .ok()
                    .and_then(|m| m.get(e.payout_id.as_uuid()).map(|(_, a)| *a));
                if let Some(amount) = amount {
                    self.update_stats(e.reseller_id, |s| s.amount_paid_out += amount);
                }
            }
        }
    }

    /// Rebuild the read model from scratch.
    ///
    /// Envelope ids are time-ordered (UUIDv7), so replay in id order restores
    /// lifecycle ordering per entity.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ResellerStatsError> {
        if let Ok(mut stats) = self.stats.write() {
            for reseller_id in stats.keys() {
                self.store.clear_owner(*reseller_id);
            }
            stats.clear();
        }
        if let Ok(mut amounts) = self.payout_amounts.write() {
            amounts.clear();
        }
        if let Ok(mut seen) = self.seen.write() {
            seen.clear();
        }

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| e.event_id());

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}

impl<S> Projection for ResellerStatsProjection<S>
where
    S: OwnerStore<OrderId, OrderSummary>,
{
    type Ev = JsonValue;

    fn apply(&self, envelope: &EventEnvelope<JsonValue>) {
        if let Err(err) = self.apply_envelope(envelope) {
            tracing::warn!(
                event_id = %envelope.event_id(),
                entity_id = %envelope.entity_id(),
                entity_type = envelope.entity_type(),
                error = %err,
                "skipping undecodable notification"
            );
        }
    }
}

fn decode<E: serde::de::DeserializeOwned>(
    envelope: &EventEnvelope<JsonValue>,
) -> Result<E, ResellerStatsError> {
    serde_json::from_value(envelope.payload().clone()).map_err(|e| {
        ResellerStatsError::Deserialize {
            entity_type: envelope.entity_type().to_string(),
            message: e.to_string(),
        }
    })
}
