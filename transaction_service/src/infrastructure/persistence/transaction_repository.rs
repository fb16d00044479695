//! Postgres-backed `TransactionRepository`, generalized from the teacher's
//! `PostgresTransactionRepository`: `update` becomes the conditional
//! `update_transaction_if_status_in` (§4.2), and `find_pending_older_than`
//! generalizes into `list_stuck_transactions` over an arbitrary status set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ids::{TransactionId, UserId};
use sqlx::PgPool;

use crate::domain::entities::{Transaction, TransactionStatus};
use crate::domain::error::TransactionError;
use crate::domain::repository::{ListTransactionsFilter, TransactionRepository};
use crate::domain::state_machine::validate_transition;
use crate::infrastructure::persistence::models::TransactionModel;

pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, TransactionError> {
        let model = sqlx::query_as::<_, TransactionModel>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TransactionError::RepositoryError(e.to_string()))?;

        Ok(model.map(Transaction::from))
    }

    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, TransactionError> {
        let model = TransactionModel::from(&transaction);

        let saved = sqlx::query_as::<_, TransactionModel>(
            r#"
            INSERT INTO transactions (
                id, sender_id, receiver_id, amount, currency, status,
                failure_reason, description, initiated_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(model.id)
        .bind(model.sender_id)
        .bind(model.receiver_id)
        .bind(model.amount)
        .bind(model.currency)
        .bind(model.status)
        .bind(model.failure_reason)
        .bind(model.description)
        .bind(model.initiated_at)
        .bind(model.completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TransactionError::RepositoryError(e.to_string()))?;

        Ok(saved.into())
    }

    /// A single conditional `UPDATE` with `status = ANY($requireStatus)` in
    /// the `WHERE` clause is the Postgres expression of §4.2's
    /// `updateTransactionIfStatusIn`; zero rows affected means the current
    /// status was not in the required set. `validate_transition` is
    /// consulted up front against the row as last observed, the same §4.4
    /// guard the in-memory implementation applies, so a caller bug that
    /// pairs an illegal `(require_status, new_status)` combination is
    /// rejected identically on both backends rather than only in tests.
    async fn update_transaction_if_status_in(
        &self,
        id: TransactionId,
        require_status: &[TransactionStatus],
        new_status: TransactionStatus,
        failure_reason: Option<String>,
    ) -> Result<Transaction, TransactionError> {
        let current = self
            .find_transaction(id)
            .await?
            .ok_or(TransactionError::NotFound(id))?;
        validate_transition(current.status, new_status)?;

        let completed_at = if new_status == TransactionStatus::Completed {
            Some(Utc::now())
        } else {
            None
        };

        let updated = sqlx::query_as::<_, TransactionModel>(
            r#"
            UPDATE transactions
            SET status = $1,
                failure_reason = COALESCE($2, failure_reason),
                completed_at = COALESCE($3, completed_at)
            WHERE id = $4 AND status = ANY($5)
            RETURNING *
            "#,
        )
        .bind(new_status)
        .bind(failure_reason)
        .bind(completed_at)
        .bind(id)
        .bind(require_status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TransactionError::RepositoryError(e.to_string()))?;

        match updated {
            Some(m) => Ok(m.into()),
            None => match self.find_transaction(id).await? {
                Some(_) => Err(TransactionError::PreconditionFailed(id)),
                None => Err(TransactionError::NotFound(id)),
            },
        }
    }

    async fn list_transactions_by_user(
        &self,
        user_id: UserId,
        filter: ListTransactionsFilter,
    ) -> Result<(Vec<Transaction>, i64), TransactionError> {
        let limit = filter.limit.clamp(1, 100);

        let models = sqlx::query_as::<_, TransactionModel>(
            r#"
            SELECT * FROM transactions
            WHERE (sender_id = $1 OR receiver_id = $1)
              AND ($2::transaction_status IS NULL OR status = $2)
            ORDER BY initiated_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TransactionError::RepositoryError(e.to_string()))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE (sender_id = $1 OR receiver_id = $1)
              AND ($2::transaction_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TransactionError::RepositoryError(e.to_string()))?;

        Ok((models.into_iter().map(Transaction::from).collect(), total))
    }

    async fn list_stuck_transactions(
        &self,
        statuses: &[TransactionStatus],
        older_than: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let models = sqlx::query_as::<_, TransactionModel>(
            r#"
            SELECT * FROM transactions
            WHERE status = ANY($1) AND initiated_at < $2
            ORDER BY initiated_at ASC
            LIMIT 50
            "#,
        )
        .bind(statuses)
        .bind(older_than)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TransactionError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(Transaction::from).collect())
    }
}
