use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendora_core::{DomainError, DomainResult, Entity, Money, ResellerId};

/// Payout identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoutId(Uuid);

impl PayoutId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PayoutId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PayoutId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PayoutId> for Uuid {
    fn from(value: PayoutId) -> Self {
        value.0
    }
}

/// Payout lifecycle: `Pending -> Processing -> Completed`, with rejection
/// (`Failed`) possible only while pending.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether a payout in this status holds commission out of the
    /// available balance. Failed payouts release their amount.
    pub fn counts_against_balance(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl core::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A withdrawal of accumulated commission.
///
/// `amount` is fixed at request time; admin actions only move the status and
/// attach payment details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    id: PayoutId,
    reseller_id: ResellerId,
    amount: Money,
    status: PayoutStatus,
    payment_method: Option<String>,
    payment_reference: Option<String>,
    notes: Option<String>,
    requested_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Payout {
    /// Open a pending payout for `amount`. Amount validity (minimum,
    /// available balance) is the ledger's concern; see
    /// [`crate::ledger::resolve_request`].
    pub fn request(reseller_id: ResellerId, amount: Money) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("payout amount must be positive"));
        }
        Ok(Self {
            id: PayoutId::new(),
            reseller_id,
            amount,
            status: PayoutStatus::Pending,
            payment_method: None,
            payment_reference: None,
            notes: None,
            requested_at: Utc::now(),
            processed_at: None,
            completed_at: None,
        })
    }

    pub fn reseller_id(&self) -> ResellerId {
        self.reseller_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PayoutStatus {
        self.status
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    fn ensure_status(&self, expected: PayoutStatus) -> DomainResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DomainError::AlreadyProcessed {
                status: self.status.as_str().to_string(),
            })
        }
    }

    /// Admin starts processing a pending payout.
    pub fn approve(&mut self, payment_method: Option<String>) -> DomainResult<()> {
        self.ensure_status(PayoutStatus::Pending)?;
        self.status = PayoutStatus::Processing;
        self.payment_method = payment_method;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Admin confirms the transfer went out. Requires processing first; a
    /// pending payout cannot jump straight to completed.
    pub fn complete(&mut self, payment_reference: Option<String>) -> DomainResult<()> {
        self.ensure_status(PayoutStatus::Processing)?;
        self.status = PayoutStatus::Completed;
        self.payment_reference = payment_reference;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Admin rejects a pending payout, releasing its amount back to the
    /// available balance.
    pub fn reject(&mut self, reason: Option<String>) -> DomainResult<()> {
        self.ensure_status(PayoutStatus::Pending)?;
        self.status = PayoutStatus::Failed;
        self.notes = reason;
        self.processed_at = Some(Utc::now());
        Ok(())
    }
}

impl Entity for Payout {
    type Id = PayoutId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payout() -> Payout {
        Payout::request(ResellerId::new(), Money::from_major(500)).unwrap()
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut p = payout();
        p.approve(Some("bank_transfer".into())).unwrap();
        assert_eq!(p.status(), PayoutStatus::Processing);
        assert!(p.processed_at().is_some());

        p.complete(Some("TXN-123".into())).unwrap();
        assert_eq!(p.status(), PayoutStatus::Completed);
        assert_eq!(p.payment_reference(), Some("TXN-123"));
        assert!(p.completed_at().is_some());
    }

    #[test]
    fn cannot_complete_before_processing() {
        let mut p = payout();
        let err = p.complete(None).unwrap_err();
        assert_eq!(err, DomainError::AlreadyProcessed { status: "pending".into() });
    }

    #[test]
    fn approve_is_not_repeatable() {
        let mut p = payout();
        p.approve(None).unwrap();
        let err = p.approve(None).unwrap_err();
        assert_eq!(err, DomainError::AlreadyProcessed { status: "processing".into() });
    }

    #[test]
    fn rejection_only_from_pending() {
        let mut p = payout();
        p.reject(Some("bank details missing".into())).unwrap();
        assert_eq!(p.status(), PayoutStatus::Failed);
        assert!(!p.status().counts_against_balance());

        let mut q = payout();
        q.approve(None).unwrap();
        assert!(q.reject(None).is_err());
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert!(Payout::request(ResellerId::new(), Money::ZERO).is_err());
    }
}
