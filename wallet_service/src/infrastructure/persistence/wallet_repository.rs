//! Postgres-backed `WalletRepository` (§4.2). The balance update is a
//! single conditional `UPDATE`, generalized from the teacher's
//! `PostgresWalletRepository::update_balance` to carry an arbitrary
//! [`BalancePredicate`] instead of always accepting the write.

use async_trait::async_trait;
use common::ids::{OperationId, UserId, WalletId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::entities::Wallet;
use crate::domain::error::WalletError;
use crate::domain::repository::{BalancePredicate, CreateOperationOutcome, WalletRepository};
use crate::infrastructure::persistence::models::{WalletModel, WalletOperationModel};

pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, WalletError> {
        let model = sqlx::query_as::<_, WalletModel>("SELECT * FROM wallets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        model.map(Wallet::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Wallet>, WalletError> {
        let model = sqlx::query_as::<_, WalletModel>(
            "SELECT * FROM wallets WHERE user_id = $1 ORDER BY currency LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        model.map(Wallet::try_from).transpose()
    }

    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, WalletError> {
        let models = sqlx::query_as::<_, WalletModel>(
            "SELECT * FROM wallets WHERE user_id = $1 ORDER BY currency",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        models.into_iter().map(Wallet::try_from).collect()
    }

    async fn create(&self, wallet: Wallet) -> Result<Wallet, WalletError> {
        let model = WalletModel::from(wallet);

        let saved = sqlx::query_as::<_, WalletModel>(
            r#"
            INSERT INTO wallets (id, user_id, balance, currency, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(model.id)
        .bind(model.user_id)
        .bind(model.balance)
        .bind(model.currency)
        .bind(model.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        Wallet::try_from(saved)
    }

    /// Single conditional `UPDATE`: the `WHERE` clause encodes `require` so
    /// the database itself refuses to commit a negative balance under
    /// concurrent writers (§4.2, §8 property 2).
    async fn conditional_increment_balance(
        &self,
        wallet_id: WalletId,
        delta: Decimal,
        require: BalancePredicate,
    ) -> Result<Wallet, WalletError> {
        let model = match require {
            BalancePredicate::Unconditional => sqlx::query_as::<_, WalletModel>(
                r#"
                UPDATE wallets SET balance = balance + $1
                WHERE id = $2
                RETURNING *
                "#,
            )
            .bind(delta)
            .bind(wallet_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WalletError::RepositoryError(e.to_string()))?,
            BalancePredicate::AtLeast(min_balance) => sqlx::query_as::<_, WalletModel>(
                r#"
                UPDATE wallets SET balance = balance + $1
                WHERE id = $2 AND balance >= $3
                RETURNING *
                "#,
            )
            .bind(delta)
            .bind(wallet_id)
            .bind(min_balance)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WalletError::RepositoryError(e.to_string()))?,
        };

        match model {
            Some(m) => Wallet::try_from(m),
            None => {
                // Either the wallet doesn't exist, or it does and the
                // predicate failed. Distinguish with a cheap follow-up read
                // so callers get the right error kind (§7).
                match self.find_by_id(wallet_id).await? {
                    Some(_) => Err(WalletError::InsufficientBalance(wallet_id)),
                    None => Err(WalletError::NotFound(wallet_id)),
                }
            }
        }
    }

    async fn create_operation_if_absent(
        &self,
        op: crate::domain::entities::WalletOperation,
    ) -> Result<CreateOperationOutcome, WalletError> {
        let operation_id = op.operation_id.clone();
        let model = WalletOperationModel::from(op);

        let result = sqlx::query_as::<_, WalletOperationModel>(
            r#"
            INSERT INTO wallet_operations
                (operation_id, wallet_id, user_id, kind, amount, result_balance, transaction_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (operation_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&model.operation_id)
        .bind(model.wallet_id)
        .bind(model.user_id)
        .bind(&model.kind)
        .bind(model.amount)
        .bind(model.result_balance)
        .bind(model.transaction_id)
        .bind(model.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        match result {
            Some(_) => Ok(CreateOperationOutcome::Inserted),
            None => {
                let existing = self
                    .find_operation(&operation_id)
                    .await?
                    .ok_or_else(|| WalletError::RepositoryError(
                        "operation insert conflicted but row is missing".into(),
                    ))?;
                Ok(CreateOperationOutcome::AlreadyExists(existing))
            }
        }
    }

    async fn find_operation(
        &self,
        operation_id: &OperationId,
    ) -> Result<Option<crate::domain::entities::WalletOperation>, WalletError> {
        let model = sqlx::query_as::<_, WalletOperationModel>(
            "SELECT * FROM wallet_operations WHERE operation_id = $1",
        )
        .bind(operation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        model
            .map(crate::domain::entities::WalletOperation::try_from)
            .transpose()
    }

    async fn list_operations_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
    ) -> Result<Vec<crate::domain::entities::WalletOperation>, WalletError> {
        let models = sqlx::query_as::<_, WalletOperationModel>(
            "SELECT * FROM wallet_operations WHERE wallet_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(wallet_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        models
            .into_iter()
            .map(crate::domain::entities::WalletOperation::try_from)
            .collect()
    }
}
