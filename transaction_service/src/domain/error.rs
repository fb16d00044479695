use common::error::CoreError;
use common::ids::{TransactionId, UserId};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TransactionError {
    #[error("transaction not found with id: {0}")]
    NotFound(TransactionId),

    #[error("sender wallet not found for user: {0}")]
    SenderWalletNotFound(UserId),

    #[error("receiver wallet not found for user: {0}")]
    ReceiverWalletNotFound(UserId),

    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The state-machine guard rejected a transition (§4.4). Non-retriable;
    /// saga handlers swallow this as a benign no-op when it arises from a
    /// duplicated event race (§4.5).
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// `updateTransactionIfStatusIn` lost a race to another writer (§4.2).
    #[error("precondition failed on transaction: {0}")]
    PreconditionFailed(TransactionId),

    /// The credit-path chaos hook (§4.5) short-circuited to failure.
    #[error("simulated failure")]
    SimulatedFailure,

    #[error("repository error: {0}")]
    RepositoryError(String),

    #[error("transient error: {0}")]
    Transient(String),
}

impl From<TransactionError> for CoreError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(id) => CoreError::NotFound(format!("transaction {}", id)),
            TransactionError::SenderWalletNotFound(id) => CoreError::NotFound(format!("sender wallet {}", id)),
            TransactionError::ReceiverWalletNotFound(id) => CoreError::NotFound(format!("receiver wallet {}", id)),
            TransactionError::InvalidArg(e) => CoreError::InvalidArg(e),
            TransactionError::InvalidStateTransition(e) => CoreError::InvalidStateTransition(e),
            TransactionError::PreconditionFailed(_) => CoreError::PreconditionFailed,
            TransactionError::SimulatedFailure => CoreError::SimulatedFailure,
            TransactionError::RepositoryError(e) => CoreError::Transient(e),
            TransactionError::Transient(e) => CoreError::Transient(e),
        }
    }
}
