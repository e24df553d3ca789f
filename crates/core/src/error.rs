//! Domain error model.
//!
//! Every variant carries enough structured detail for a caller to
//! self-correct without a second round-trip (the required floor price, the
//! available stock, the current status). [`DomainError::kind`] collapses the
//! variants into the five-way taxonomy callers map onto their own surface.

use thiserror::Error;

use crate::money::Money;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Broad error category, for callers that map errors onto a transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; never retried.
    Validation,
    /// A pricing/markup policy was violated; retry after correcting.
    PolicyViolation,
    /// State moved underneath the caller; re-fetch and decide.
    Conflict,
    /// Unknown id or slug.
    NotFound,
    /// Role or ownership mismatch.
    AccessDenied,
}

/// Domain-level error.
///
/// Keep this focused on deterministic business failures. Infrastructure
/// concerns (connection loss, serialization) belong to the store layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Proposed retail price is below the manufacturer's markup floor.
    #[error("retail price {proposed} is below the required minimum {required_minimum}")]
    PriceBelowFloor {
        required_minimum: Money,
        proposed: Money,
    },

    /// Not enough stock to satisfy the requested quantity.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    /// The (reseller, product) pair already has a binding.
    #[error("product is already listed in this storefront")]
    DuplicateBinding,

    /// The order reached a terminal status; no further transitions.
    #[error("order is already finalized (status {status})")]
    OrderAlreadyFinalized { status: String },

    /// The requested status transition is not in the lifecycle graph.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The payout is not in the status the action requires.
    #[error("payout already processed (status {status})")]
    AlreadyProcessed { status: String },

    /// No commission available to pay out.
    #[error("no available balance for payout")]
    NoBalance,

    /// Resolved payout amount is under the configured minimum.
    #[error("payout amount {requested} is below the minimum {minimum}")]
    BelowMinimum { minimum: Money, requested: Money },

    /// The referenced listing (or its product) is missing or inactive.
    #[error("product is not available for purchase")]
    ProductUnavailable,

    /// No published storefront under the given slug.
    #[error("store not found")]
    StoreNotFound,

    /// A requested resource was not found (domain-level).
    #[error("{0} not found")]
    NotFound(String),

    /// Authorization failure at the domain boundary.
    #[error("access denied")]
    AccessDenied,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidId(_) => ErrorKind::Validation,
            Self::PriceBelowFloor { .. } => ErrorKind::PolicyViolation,
            Self::InsufficientStock { .. }
            | Self::DuplicateBinding
            | Self::OrderAlreadyFinalized { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyProcessed { .. }
            | Self::NoBalance
            | Self::BelowMinimum { .. } => ErrorKind::Conflict,
            Self::ProductUnavailable | Self::StoreNotFound | Self::NotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AccessDenied => ErrorKind::AccessDenied,
        }
    }
}
