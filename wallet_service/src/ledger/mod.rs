//! Wallet Ledger (C): the uniform atomic debit/credit/refund/deposit
//! algorithm of spec §4.3, generalized from the teacher's
//! `ProcessMovementUseCase` (a thin repository-delegating use case) into the
//! full idempotent algorithm with event publication.

use std::sync::Arc;

use common::events::{DomainEvent, EventBus, EventType, OperationKind};
use common::ids::{OperationId, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::WalletOperation;
use crate::domain::error::WalletError;
use crate::domain::repository::{BalancePredicate, CreateOperationOutcome, WalletRepository};

/// Result of a ledger operation (§4.3). `idempotent = true` means the
/// balance was NOT changed by this call — a prior call already applied it.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub new_balance: Decimal,
    pub operation_id: OperationId,
    pub idempotent: bool,
    pub kind: OperationKind,
}

pub struct WalletLedger {
    repo: Arc<dyn WalletRepository>,
    bus: Arc<dyn EventBus>,
}

impl WalletLedger {
    pub fn new(repo: Arc<dyn WalletRepository>, bus: Arc<dyn EventBus>) -> Self {
        Self { repo, bus }
    }

    pub async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<OperationResult, WalletError> {
        self.apply(
            user_id,
            amount,
            OperationKind::Debit,
            OperationId::for_transaction(transaction_id, OperationKind::Debit),
            Some(transaction_id),
            (EventType::DebitSuccess, EventType::DebitFailed),
        )
        .await
    }

    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<OperationResult, WalletError> {
        self.apply(
            user_id,
            amount,
            OperationKind::Credit,
            OperationId::for_transaction(transaction_id, OperationKind::Credit),
            Some(transaction_id),
            (EventType::CreditSuccess, EventType::CreditFailed),
        )
        .await
    }

    pub async fn refund(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<OperationResult, WalletError> {
        self.apply(
            user_id,
            amount,
            OperationKind::Refund,
            OperationId::for_transaction(transaction_id, OperationKind::Refund),
            Some(transaction_id),
            (EventType::RefundCompleted, EventType::RefundFailed),
        )
        .await
    }

    /// Deposits publish no domain event in this core (§4.3 step 6); `events`
    /// below is `None` to reflect that.
    pub async fn deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        client_key: &str,
    ) -> Result<OperationResult, WalletError> {
        self.apply_inner(
            user_id,
            amount,
            OperationKind::Deposit,
            OperationId::for_deposit(client_key),
            None,
            None,
        )
        .await
    }

    async fn apply(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: OperationKind,
        operation_id: OperationId,
        transaction_id: Option<TransactionId>,
        events: (EventType, EventType),
    ) -> Result<OperationResult, WalletError> {
        self.apply_inner(user_id, amount, kind, operation_id, transaction_id, Some(events))
            .await
    }

    /// The algorithm of §4.3, steps 1-6.
    async fn apply_inner(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: OperationKind,
        operation_id: OperationId,
        transaction_id: Option<TransactionId>,
        events: Option<(EventType, EventType)>,
    ) -> Result<OperationResult, WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::InvalidData("amount must be > 0".into()));
        }

        // Step 2: idempotency short-circuit. No event is published for a
        // replay (§4.3 step 2).
        if let Some(existing) = self.repo.find_operation(&operation_id).await? {
            return Ok(OperationResult {
                success: true,
                new_balance: existing.result_balance,
                operation_id,
                idempotent: true,
                kind,
            });
        }

        // Step 3: resolve the wallet.
        let wallet = match self.repo.find_by_user(user_id).await? {
            Some(w) => w,
            None => {
                if let Some((_, failed)) = events {
                    self.publish_failure(failed, transaction_id, "NOT_FOUND").await;
                }
                return Err(WalletError::UserNotFound(user_id));
            }
        };

        let (delta, predicate) = match kind {
            OperationKind::Debit => (-amount, BalancePredicate::AtLeast(amount)),
            OperationKind::Credit | OperationKind::Refund | OperationKind::Deposit => {
                (amount, BalancePredicate::Unconditional)
            }
        };

        // Step 4: the conditional atomic update.
        let updated = match self
            .repo
            .conditional_increment_balance(wallet.id(), delta, predicate)
            .await
        {
            Ok(w) => w,
            Err(WalletError::InsufficientBalance(id)) => {
                if let Some((_, failed)) = events {
                    self.publish_failure(failed, transaction_id, "INSUFFICIENT_BALANCE").await;
                }
                return Err(WalletError::InsufficientBalance(id));
            }
            Err(e) => return Err(e),
        };

        // Step 5: record the operation row, guarding against a concurrent
        // writer that beat us to it.
        let op = WalletOperation {
            operation_id: operation_id.clone(),
            wallet_id: updated.id(),
            user_id,
            kind,
            amount,
            result_balance: updated.balance(),
            transaction_id,
            created_at: chrono::Utc::now(),
        };

        let result_balance = match self.repo.create_operation_if_absent(op).await? {
            CreateOperationOutcome::Inserted => updated.balance(),
            CreateOperationOutcome::AlreadyExists(existing) => {
                // A concurrent writer won the race after our balance update
                // already committed. We do not revert it; we report the
                // value recorded by the winning writer (§4.3 step 5).
                warn!(%operation_id, "operation row already existed after balance update committed");
                existing.result_balance
            }
        };

        // Step 6: publish the success event.
        if let Some((success, _)) = events {
            if let Some(txn_id) = transaction_id {
                self.publish(success, txn_id, json!({ "newBalance": result_balance })).await;
            }
        }

        info!(%operation_id, ?kind, new_balance = %result_balance, "wallet operation applied");

        Ok(OperationResult {
            success: true,
            new_balance: result_balance,
            operation_id,
            idempotent: false,
            kind,
        })
    }

    async fn publish(&self, event_type: EventType, transaction_id: TransactionId, payload: serde_json::Value) {
        let event = DomainEvent::new(event_type, transaction_id, payload);
        if let Err(e) = self.bus.publish(event).await {
            warn!(error = %e, %event_type, "failed to publish ledger event");
        }
    }

    async fn publish_failure(
        &self,
        event_type: EventType,
        transaction_id: Option<TransactionId>,
        reason: &str,
    ) {
        if let Some(txn_id) = transaction_id {
            self.publish(event_type, txn_id, json!({ "reason": reason })).await;
        }
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<Decimal, WalletError> {
        let wallet = self
            .repo
            .find_by_user(user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))?;
        Ok(wallet.balance())
    }

    pub async fn history(&self, user_id: UserId, limit: i64) -> Result<Vec<WalletOperation>, WalletError> {
        let wallet = self
            .repo
            .find_by_user(user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))?;
        self.repo.list_operations_for_wallet(wallet.id(), limit).await
    }
}
