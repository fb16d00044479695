//! Postgres-backed [`WebhookRepository`], shaped after
//! `wallet_service::infrastructure::persistence::wallet_repository`'s
//! trait-plus-Postgres-impl split: a `FromRow` model per table, explicit
//! `INSERT ... RETURNING *` / `SELECT *` statements, errors folded into
//! `WebhookError::RepositoryError`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::events::EventType;
use common::ids::{DeliveryId, TransactionId, UserId, WebhookId};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::webhook::entities::{DeliveryStatus, WebhookDelivery, WebhookSubscription};
use crate::webhook::error::WebhookError;
use crate::webhook::repository::WebhookRepository;

#[derive(Debug, FromRow)]
struct WebhookSubscriptionModel {
    webhook_id: WebhookId,
    user_id: UserId,
    url: String,
    secret: String,
    events: Vec<EventType>,
    is_active: bool,
    failure_count: i32,
    created_at: DateTime<Utc>,
}

impl From<WebhookSubscriptionModel> for WebhookSubscription {
    fn from(m: WebhookSubscriptionModel) -> Self {
        Self {
            webhook_id: m.webhook_id,
            user_id: m.user_id,
            url: m.url,
            secret: m.secret,
            events: m.events,
            is_active: m.is_active,
            failure_count: m.failure_count as u32,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct WebhookDeliveryModel {
    delivery_id: DeliveryId,
    webhook_id: WebhookId,
    transaction_id: TransactionId,
    event_type: EventType,
    payload: Json<serde_json::Value>,
    status: DeliveryStatus,
    attempt_count: i32,
    response_code: Option<i32>,
    error: Option<String>,
    next_retry_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<WebhookDeliveryModel> for WebhookDelivery {
    fn from(m: WebhookDeliveryModel) -> Self {
        Self {
            delivery_id: m.delivery_id,
            webhook_id: m.webhook_id,
            transaction_id: m.transaction_id,
            event_type: m.event_type,
            payload: m.payload.0,
            status: m.status,
            attempt_count: m.attempt_count as u32,
            response_code: m.response_code.map(|c| c as u16),
            error: m.error,
            next_retry_at: m.next_retry_at,
            completed_at: m.completed_at,
        }
    }
}

pub struct PostgresWebhookRepository {
    pool: PgPool,
}

impl PostgresWebhookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookRepository for PostgresWebhookRepository {
    async fn create_subscription(&self, sub: WebhookSubscription) -> Result<WebhookSubscription, WebhookError> {
        let model = sqlx::query_as::<_, WebhookSubscriptionModel>(
            r#"
            INSERT INTO webhook_subscriptions
                (webhook_id, user_id, url, secret, events, is_active, failure_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(sub.webhook_id)
        .bind(sub.user_id)
        .bind(&sub.url)
        .bind(&sub.secret)
        .bind(&sub.events)
        .bind(sub.is_active)
        .bind(sub.failure_count as i32)
        .bind(sub.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => WebhookError::Conflict(sub.user_id),
            other => WebhookError::RepositoryError(other.to_string()),
        })?;

        Ok(model.into())
    }

    async fn get_subscription(&self, id: WebhookId) -> Result<Option<WebhookSubscription>, WebhookError> {
        let model = sqlx::query_as::<_, WebhookSubscriptionModel>(
            "SELECT * FROM webhook_subscriptions WHERE webhook_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(model.map(Into::into))
    }

    async fn find_by_user_and_url(&self, user_id: UserId, url: &str) -> Result<Option<WebhookSubscription>, WebhookError> {
        let model = sqlx::query_as::<_, WebhookSubscriptionModel>(
            "SELECT * FROM webhook_subscriptions WHERE user_id = $1 AND url = $2",
        )
        .bind(user_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(model.map(Into::into))
    }

    async fn list_subscriptions(&self, user_id: UserId) -> Result<Vec<WebhookSubscription>, WebhookError> {
        let models = sqlx::query_as::<_, WebhookSubscriptionModel>(
            "SELECT * FROM webhook_subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_subscription(&self, sub: WebhookSubscription) -> Result<WebhookSubscription, WebhookError> {
        let model = sqlx::query_as::<_, WebhookSubscriptionModel>(
            r#"
            UPDATE webhook_subscriptions
            SET url = $1, secret = $2, events = $3, is_active = $4, failure_count = $5
            WHERE webhook_id = $6
            RETURNING *
            "#,
        )
        .bind(&sub.url)
        .bind(&sub.secret)
        .bind(&sub.events)
        .bind(sub.is_active)
        .bind(sub.failure_count as i32)
        .bind(sub.webhook_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        model.map(Into::into).ok_or(WebhookError::NotFound(sub.webhook_id))
    }

    async fn delete_subscription(&self, id: WebhookId) -> Result<(), WebhookError> {
        let result = sqlx::query("DELETE FROM webhook_subscriptions WHERE webhook_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(WebhookError::NotFound(id));
        }
        Ok(())
    }

    async fn find_active_for_event(&self, event_type: EventType) -> Result<Vec<WebhookSubscription>, WebhookError> {
        let models = sqlx::query_as::<_, WebhookSubscriptionModel>(
            "SELECT * FROM webhook_subscriptions WHERE is_active AND $1 = ANY(events)",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create_delivery(&self, delivery: WebhookDelivery) -> Result<WebhookDelivery, WebhookError> {
        let model = sqlx::query_as::<_, WebhookDeliveryModel>(
            r#"
            INSERT INTO webhook_deliveries
                (delivery_id, webhook_id, transaction_id, event_type, payload, status,
                 attempt_count, response_code, error, next_retry_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(delivery.delivery_id)
        .bind(delivery.webhook_id)
        .bind(delivery.transaction_id)
        .bind(delivery.event_type)
        .bind(Json(&delivery.payload))
        .bind(delivery.status)
        .bind(delivery.attempt_count as i32)
        .bind(delivery.response_code.map(|c| c as i32))
        .bind(&delivery.error)
        .bind(delivery.next_retry_at)
        .bind(delivery.completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(model.into())
    }

    async fn update_delivery(&self, delivery: WebhookDelivery) -> Result<WebhookDelivery, WebhookError> {
        let model = sqlx::query_as::<_, WebhookDeliveryModel>(
            r#"
            UPDATE webhook_deliveries
            SET status = $1, attempt_count = $2, response_code = $3, error = $4,
                next_retry_at = $5, completed_at = $6
            WHERE delivery_id = $7
            RETURNING *
            "#,
        )
        .bind(delivery.status)
        .bind(delivery.attempt_count as i32)
        .bind(delivery.response_code.map(|c| c as i32))
        .bind(&delivery.error)
        .bind(delivery.next_retry_at)
        .bind(delivery.completed_at)
        .bind(delivery.delivery_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        model.map(Into::into).ok_or(WebhookError::NotFound(delivery.webhook_id))
    }

    async fn list_deliveries(&self, webhook_id: WebhookId) -> Result<Vec<WebhookDelivery>, WebhookError> {
        let models = sqlx::query_as::<_, WebhookDeliveryModel>(
            "SELECT * FROM webhook_deliveries WHERE webhook_id = $1 ORDER BY delivery_id",
        )
        .bind(webhook_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_delivery(&self, id: DeliveryId) -> Result<Option<WebhookDelivery>, WebhookError> {
        let model = sqlx::query_as::<_, WebhookDeliveryModel>(
            "SELECT * FROM webhook_deliveries WHERE delivery_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WebhookError::RepositoryError(e.to_string()))?;

        Ok(model.map(Into::into))
    }
}
