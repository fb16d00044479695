//! `getTransaction` (§6), generalized from the teacher's
//! `GetTransactionDetailsUseCase` onto the new `TransactionId` newtype and
//! `TransactionRepository::find_transaction` port.

use std::sync::Arc;

use common::ids::TransactionId;

use crate::domain::entities::Transaction;
use crate::domain::error::TransactionError;
use crate::domain::repository::TransactionRepository;

#[derive(Clone)]
pub struct GetTransactionDetailsUseCase {
    transaction_repo: Arc<dyn TransactionRepository>,
}

impl GetTransactionDetailsUseCase {
    pub fn new(transaction_repo: Arc<dyn TransactionRepository>) -> Self {
        Self { transaction_repo }
    }

    #[tracing::instrument(name = "GetTransactionDetailsUseCase::execute", skip(self))]
    pub async fn execute(&self, transaction_id: TransactionId) -> Result<Transaction, TransactionError> {
        self.transaction_repo
            .find_transaction(transaction_id)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::in_memory::InMemoryTransactionRepository;
    use common::ids::UserId;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn returns_not_found_for_unknown_id() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        let use_case = GetTransactionDetailsUseCase::new(repo);

        let err = use_case.execute(TransactionId::new()).await.unwrap_err();
        assert!(matches!(err, TransactionError::NotFound(_)));
    }

    #[tokio::test]
    async fn returns_the_stored_transaction() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        let txn = crate::domain::entities::Transaction::new(
            UserId::new(),
            UserId::new(),
            Decimal::new(100, 0),
            "USD".to_string(),
            None,
        );
        let created = repo.create_transaction(txn).await.unwrap();

        let use_case = GetTransactionDetailsUseCase::new(repo);
        let found = use_case.execute(created.id).await.unwrap();
        assert_eq!(found.id, created.id);
    }
}
