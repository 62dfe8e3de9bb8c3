//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is raised *before* any mutation, so the caller can correct
/// its input (or remediate the missing precondition) and retry. Infrastructure
/// faults belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input: bad amount, missing field, discount out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The target is not in a state that allows the command
    /// (invoice already paid, invoice still a draft, wrong customer, ...).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A catalog product does not have enough stock for the requested quantity.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u64,
        available: i64,
    },

    /// A fulfillment transition needs a linked, numbered invoice first.
    ///
    /// Carries the status the caller was trying to reach so the same
    /// transition can be retried once an invoice is linked.
    #[error("invoice required before moving to {target_status}")]
    InvoiceRequired { target_status: String },

    /// The transition table has no edge between the two states.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("not found")]
    NotFound,

    /// Duplicate creation, repeated one-way transition, or a stale version.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn invoice_required(target_status: impl Into<String>) -> Self {
        Self::InvoiceRequired {
            target_status: target_status.into(),
        }
    }

    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
