//! Ledger Store ports (B), generalizing the teacher's `UserRepository` /
//! `WalletRepository` traits into the primitives §4.2 names explicitly
//! (`findWalletByUser`, `conditionalIncrementBalance`,
//! `createOperationIfAbsent`, `findOperation`).

use async_trait::async_trait;
use common::ids::{OperationId, UserId, WalletId};
use rust_decimal::Decimal;

use crate::domain::entities::{User, Wallet, WalletOperation};
use crate::domain::error::{UserError, WalletError};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
    async fn create(&self, user: User) -> Result<User, UserError>;
}

/// A conditional-update predicate for `conditional_increment_balance`
/// (§4.2). `AtLeast` is used for debits (`balance >= amount`); `Unconditional`
/// for credits, refunds, and deposits.
#[derive(Debug, Clone, Copy)]
pub enum BalancePredicate {
    AtLeast(Decimal),
    Unconditional,
}

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, WalletError>;
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Wallet>, WalletError>;
    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError>;
    async fn create(&self, wallet: Wallet) -> Result<Wallet, WalletError>;

    /// Atomically applies `delta` to the wallet's balance, committing only
    /// if `require` holds at commit time (§4.2). Implementable as a single
    /// conditional `UPDATE` against the backing store. Returns
    /// `WalletError::NotFound` if the wallet does not exist, or
    /// `WalletError::InsufficientBalance` / `PreconditionFailed` if the
    /// predicate does not hold.
    async fn conditional_increment_balance(
        &self,
        wallet_id: WalletId,
        delta: Decimal,
        require: BalancePredicate,
    ) -> Result<Wallet, WalletError>;

    /// Inserts an operation row only if `operation_id` is not already
    /// present; a unique index enforces this server-side. Returns the
    /// existing row when a concurrent writer won the race.
    async fn create_operation_if_absent(
        &self,
        op: WalletOperation,
    ) -> Result<CreateOperationOutcome, WalletError>;

    async fn find_operation(
        &self,
        operation_id: &OperationId,
    ) -> Result<Option<WalletOperation>, WalletError>;

    async fn list_operations_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
    ) -> Result<Vec<WalletOperation>, WalletError>;
}

pub enum CreateOperationOutcome {
    Inserted,
    AlreadyExists(WalletOperation),
}
