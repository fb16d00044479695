use common::error::CoreError;
use common::ids::{UserId, WalletId};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum UserError {
    #[error("user not found with id: {0}")]
    NotFound(UserId),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("repository error: {0}")]
    RepositoryError(String),

    #[error("invalid user data: {0}")]
    InvalidData(String),
}

impl From<UserError> for CoreError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => CoreError::NotFound(format!("user {}", id)),
            UserError::EmailTaken(email) => CoreError::Conflict(format!("email taken: {}", email)),
            UserError::RepositoryError(e) => CoreError::Transient(e),
            UserError::InvalidData(e) => CoreError::InvalidArg(e),
        }
    }
}

/// Errors from §4.2/§4.3's ledger primitives, mapped onto the shared §7
/// taxonomy at the saga/API boundary.
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("wallet not found with id: {0}")]
    NotFound(WalletId),

    #[error("user not found with id: {0}")]
    UserNotFound(UserId),

    #[error("invalid wallet data: {0}")]
    InvalidData(String),

    #[error("insufficient balance in wallet: {0}")]
    InsufficientBalance(WalletId),

    /// The conditional update's precondition did not hold at commit time
    /// (§4.2). Distinct from `InsufficientBalance`: this can also arise for
    /// a benign concurrent race on `createOperationIfAbsent` (§4.3 step 5).
    #[error("precondition failed on wallet: {0}")]
    PreconditionFailed(WalletId),

    #[error("repository error: {0}")]
    RepositoryError(String),
}

impl From<WalletError> for CoreError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotFound(id) => CoreError::NotFound(format!("wallet {}", id)),
            WalletError::UserNotFound(id) => CoreError::NotFound(format!("user {}", id)),
            WalletError::InvalidData(e) => CoreError::InvalidArg(e),
            WalletError::InsufficientBalance(_) => CoreError::InsufficientBalance,
            WalletError::PreconditionFailed(_) => CoreError::PreconditionFailed,
            WalletError::RepositoryError(e) => CoreError::Transient(e),
        }
    }
}
