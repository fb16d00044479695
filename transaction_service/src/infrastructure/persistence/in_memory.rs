//! In-memory `TransactionRepository`, same trait as the Postgres
//! implementation, for saga/property tests (§8 scenarios S1-S6) without a
//! database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ids::{TransactionId, UserId};

use crate::domain::entities::{Transaction, TransactionStatus};
use crate::domain::error::TransactionError;
use crate::domain::repository::{ListTransactionsFilter, TransactionRepository};
use crate::domain::state_machine::validate_transition;

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    transactions: Mutex<HashMap<TransactionId, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, TransactionError> {
        Ok(self.transactions.lock().unwrap().get(&id).cloned())
    }

    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, TransactionError> {
        let mut transactions = self.transactions.lock().unwrap();
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction_if_status_in(
        &self,
        id: TransactionId,
        require_status: &[TransactionStatus],
        new_status: TransactionStatus,
        failure_reason: Option<String>,
    ) -> Result<Transaction, TransactionError> {
        let mut transactions = self.transactions.lock().unwrap();
        let txn = transactions.get_mut(&id).ok_or(TransactionError::NotFound(id))?;

        if !require_status.contains(&txn.status) {
            return Err(TransactionError::PreconditionFailed(id));
        }
        validate_transition(txn.status, new_status)?;

        txn.status = new_status;
        if let Some(reason) = failure_reason {
            txn.failure_reason = Some(reason);
        }
        if new_status == TransactionStatus::Completed {
            txn.completed_at = Some(Utc::now());
        }

        Ok(txn.clone())
    }

    async fn list_transactions_by_user(
        &self,
        user_id: UserId,
        filter: ListTransactionsFilter,
    ) -> Result<(Vec<Transaction>, i64), TransactionError> {
        let transactions = self.transactions.lock().unwrap();
        let mut matching: Vec<Transaction> = transactions
            .values()
            .filter(|t| t.sender_id == user_id || t.receiver_id == user_id)
            .filter(|t| filter.status.map(|s| s == t.status).unwrap_or(true))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.initiated_at.cmp(&a.initiated_at));

        let total = matching.len() as i64;
        let limit = filter.limit.clamp(1, 100) as usize;
        let offset = filter.offset.max(0) as usize;
        let page = matching.into_iter().skip(offset).take(limit).collect();

        Ok((page, total))
    }

    async fn list_stuck_transactions(
        &self,
        statuses: &[TransactionStatus],
        older_than: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let transactions = self.transactions.lock().unwrap();
        let mut stuck: Vec<Transaction> = transactions
            .values()
            .filter(|t| statuses.contains(&t.status) && t.initiated_at < older_than)
            .cloned()
            .collect();
        stuck.sort_by(|a, b| a.initiated_at.cmp(&b.initiated_at));
        stuck.truncate(50);
        Ok(stuck)
    }
}
