//! In-memory `UserRepository`/`WalletRepository`, same trait as the
//! Postgres implementation. Used by unit and concurrency/property tests so
//! §8's invariants (non-negativity, at-most-once effect) can be exercised
//! under real task interleaving via `tokio::test(flavor = "multi_thread")`
//! without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::ids::{OperationId, UserId, WalletId};
use rust_decimal::Decimal;

use crate::domain::entities::{User, Wallet, WalletOperation};
use crate::domain::error::{UserError, WalletError};
use crate::domain::repository::{BalancePredicate, CreateOperationOutcome, UserRepository, WalletRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email() == user.email()) {
            return Err(UserError::EmailTaken(user.email().to_string()));
        }
        users.insert(user.id(), user.clone());
        Ok(user)
    }
}

/// Wallets and operations share one lock: the conditional balance update and
/// the operation-row insert must observe a consistent view of each other
/// under concurrent callers, exactly as a single Postgres transaction would.
#[derive(Default)]
pub struct InMemoryWalletRepository {
    wallets: Mutex<HashMap<WalletId, Wallet>>,
    operations: Mutex<HashMap<OperationId, WalletOperation>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, WalletError> {
        Ok(self.wallets.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Wallet>, WalletError> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .values()
            .find(|w| w.user_id() == user_id)
            .cloned())
    }

    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, wallet: Wallet) -> Result<Wallet, WalletError> {
        let mut wallets = self.wallets.lock().unwrap();
        wallets.insert(wallet.id(), wallet.clone());
        Ok(wallet)
    }

    async fn conditional_increment_balance(
        &self,
        wallet_id: WalletId,
        delta: Decimal,
        require: BalancePredicate,
    ) -> Result<Wallet, WalletError> {
        let mut wallets = self.wallets.lock().unwrap();
        let wallet = wallets.get(&wallet_id).ok_or(WalletError::NotFound(wallet_id))?;

        if let BalancePredicate::AtLeast(min) = require {
            if wallet.balance() < min {
                return Err(WalletError::InsufficientBalance(wallet_id));
            }
        }

        let updated = wallet.with_balance(wallet.balance() + delta);
        wallets.insert(wallet_id, updated.clone());
        Ok(updated)
    }

    async fn create_operation_if_absent(
        &self,
        op: WalletOperation,
    ) -> Result<CreateOperationOutcome, WalletError> {
        let mut operations = self.operations.lock().unwrap();
        if let Some(existing) = operations.get(&op.operation_id) {
            return Ok(CreateOperationOutcome::AlreadyExists(existing.clone()));
        }
        operations.insert(op.operation_id.clone(), op);
        Ok(CreateOperationOutcome::Inserted)
    }

    async fn find_operation(&self, operation_id: &OperationId) -> Result<Option<WalletOperation>, WalletError> {
        Ok(self.operations.lock().unwrap().get(operation_id).cloned())
    }

    async fn list_operations_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
    ) -> Result<Vec<WalletOperation>, WalletError> {
        let mut ops: Vec<WalletOperation> = self
            .operations
            .lock()
            .unwrap()
            .values()
            .filter(|op| op.wallet_id == wallet_id)
            .cloned()
            .collect();
        ops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ops.truncate(limit.max(0) as usize);
        Ok(ops)
    }
}
