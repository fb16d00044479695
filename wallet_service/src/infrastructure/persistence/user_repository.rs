//! Postgres-backed `UserRepository`. Generalized from the teacher's
//! `PostgresUserRepository`: `exists_by_username` becomes `find_by_email`,
//! matching the spec's email-uniqueness invariant (§3) instead of a
//! username one.

use async_trait::async_trait;
use common::ids::UserId;
use sqlx::PgPool;

use crate::domain::entities::User;
use crate::domain::error::UserError;
use crate::domain::repository::UserRepository;
use crate::infrastructure::persistence::models::UserModel;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError> {
        let model = sqlx::query_as::<_, UserModel>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::RepositoryError(e.to_string()))?;

        model.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let model = sqlx::query_as::<_, UserModel>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::RepositoryError(e.to_string()))?;

        model.map(User::try_from).transpose()
    }

    async fn create(&self, user: User) -> Result<User, UserError> {
        let model = UserModel::from(user);
        let email_for_error = model.email.clone();

        let saved = sqlx::query_as::<_, UserModel>(
            r#"
            INSERT INTO users (id, name, email, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(model.id)
        .bind(model.name)
        .bind(model.email)
        .bind(model.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("users_email_key") {
                UserError::EmailTaken(email_for_error)
            } else {
                UserError::RepositoryError(msg)
            }
        })?;

        User::try_from(saved)
    }
}
