//! Ledger Store ports (B) relevant to transactions, generalized from the
//! teacher's `save`/`find_by_id`/`find_by_wallet_id` trio into §4.2's
//! `findTransaction`/`createTransaction`/`updateTransactionIfStatusIn`/
//! `listTransactionsByUser`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ids::{TransactionId, UserId};

use crate::domain::entities::{Transaction, TransactionStatus};
use crate::domain::error::TransactionError;

#[derive(Debug, Clone, Default)]
pub struct ListTransactionsFilter {
    pub status: Option<TransactionStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, TransactionError>;

    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, TransactionError>;

    /// Commits `new_status` (plus any `extra` field updates the caller
    /// folds in, e.g. `completedAt`/`failureReason`) only if the current
    /// status is one of `require_status`. Returns `PreconditionFailed`
    /// otherwise, which saga handlers treat as a benign no-op (§4.5).
    async fn update_transaction_if_status_in(
        &self,
        id: TransactionId,
        require_status: &[TransactionStatus],
        new_status: TransactionStatus,
        failure_reason: Option<String>,
    ) -> Result<Transaction, TransactionError>;

    async fn list_transactions_by_user(
        &self,
        user_id: UserId,
        filter: ListTransactionsFilter,
    ) -> Result<(Vec<Transaction>, i64), TransactionError>;

    /// Supports the reconciliation sweep (SPEC_FULL.md "Supplemented
    /// features"): transactions stuck in a non-terminal status older than
    /// `older_than`.
    async fn list_stuck_transactions(
        &self,
        statuses: &[TransactionStatus],
        older_than: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, TransactionError>;
}
