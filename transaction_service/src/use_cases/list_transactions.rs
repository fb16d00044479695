//! `listTransactions(userId, {status?, limit, offset}) -> {items, total}`
//! (§6), generalized from the teacher's `GetWalletHistoryUseCase`
//! (`find_by_wallet_id`, unpaginated) into the paginated, status-filterable
//! query of §4.2.

use std::sync::Arc;

use common::ids::UserId;
use serde::Serialize;

use crate::domain::entities::{Transaction, TransactionStatus};
use crate::domain::error::TransactionError;
use crate::domain::repository::{ListTransactionsFilter, TransactionRepository};

#[derive(Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: i64,
}

#[derive(Clone)]
pub struct ListTransactionsUseCase {
    transaction_repo: Arc<dyn TransactionRepository>,
}

impl ListTransactionsUseCase {
    pub fn new(transaction_repo: Arc<dyn TransactionRepository>) -> Self {
        Self { transaction_repo }
    }

    #[tracing::instrument(name = "ListTransactionsUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        user_id: UserId,
        status: Option<TransactionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<TransactionPage, TransactionError> {
        let (items, total) = self
            .transaction_repo
            .list_transactions_by_user(
                user_id,
                ListTransactionsFilter {
                    status,
                    limit: limit.clamp(1, 100),
                    offset: offset.max(0),
                },
            )
            .await?;

        Ok(TransactionPage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::in_memory::InMemoryTransactionRepository;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn paginates_and_orders_newest_first() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        let alice = UserId::new();
        let bob = UserId::new();

        for _ in 0..3 {
            let txn = Transaction::new(alice, bob, Decimal::new(10, 0), "USD".to_string(), None);
            repo.create_transaction(txn).await.unwrap();
        }

        let use_case = ListTransactionsUseCase::new(repo);
        let page = use_case.execute(alice, None, 2, 0).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
    }
}
