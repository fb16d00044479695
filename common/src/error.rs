//! Shared error taxonomy (§7). Crate-local error enums (`WalletError`,
//! `TransactionError`, ...) carry richer context and convert into this
//! taxonomy at API boundaries, the way the teacher's `UserError`/`WalletError`
//! convert into `ApiError` in `api/error.rs`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input validation failure (HTTP 400 at the out-of-scope API layer).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Raised by the out-of-scope HTTP layer; represented here only so
    /// crate-local errors have somewhere to map an authn/authz failure
    /// coming from a collaborator.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("forbidden")]
    Forbidden,

    /// Transaction, Wallet, or Subscription not found (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate subscription URL, re-registration of an email (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Debit predicate failed (HTTP 400).
    #[error("insufficient balance")]
    InsufficientBalance,

    /// State machine guard violated. Non-retriable; surfaces as 409 to
    /// callers, swallowed as a benign no-op by saga handlers only when it is
    /// specifically a `PreconditionFailed` (see below), not this variant.
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Optimistic-update race. The saga treats this as a benign no-op.
    #[error("precondition failed")]
    PreconditionFailed,

    /// Raised by the credit-path chaos hook (§4.5); treated as a credit
    /// failure, triggers compensation.
    #[error("simulated failure")]
    SimulatedFailure,

    /// Network/store timeout. Retried by the queue for job paths, surfaced
    /// to callers for request paths.
    #[error("transient error: {0}")]
    Transient(String),
}
