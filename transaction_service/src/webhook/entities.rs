//! Webhook subscription and delivery entities (§3). Grounded on the
//! teacher's entity-builder shape (`wallet_service::domain::entities`) and
//! generalized from scratch since the teacher has no webhook concept of its
//! own.

use chrono::{DateTime, Utc};
use common::events::EventType;
use common::ids::{DeliveryId, TransactionId, UserId, WebhookId};
use serde::{Deserialize, Serialize};

use crate::webhook::error::WebhookError;

/// Minimum secret length the source requires (§3): `secret (>= 32B)`.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub webhook_id: WebhookId,
    pub user_id: UserId,
    pub url: String,
    pub secret: String,
    pub events: Vec<EventType>,
    pub is_active: bool,
    pub failure_count: u32,
    pub created_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// Validates the §3 invariants shared by every subscription: HTTPS-only
    /// URL, a secret of at least 32 bytes, and a non-empty event list.
    pub fn new(user_id: UserId, url: String, secret: String, events: Vec<EventType>) -> Result<Self, WebhookError> {
        if !url.starts_with("https://") {
            return Err(WebhookError::InvalidUrl(url));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(WebhookError::InvalidData(format!(
                "secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if events.is_empty() {
            return Err(WebhookError::InvalidData("events must not be empty".into()));
        }

        Ok(Self {
            webhook_id: WebhookId::new(),
            user_id,
            url,
            secret,
            events,
            is_active: true,
            failure_count: 0,
            created_at: Utc::now(),
        })
    }

    pub fn wants(&self, event_type: EventType) -> bool {
        self.is_active && self.events.contains(&event_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed,
    Retrying,
}

/// `deliveryId` doubles as the queue `jobId` for idempotent resubmission
/// (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub delivery_id: DeliveryId,
    pub webhook_id: WebhookId,
    pub transaction_id: TransactionId,
    pub event_type: EventType,
    pub payload: serde_json::Value,
    pub status: DeliveryStatus,
    pub attempt_count: u32,
    pub response_code: Option<u16>,
    pub error: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WebhookDelivery {
    pub fn new(webhook_id: WebhookId, transaction_id: TransactionId, event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            delivery_id: DeliveryId::new(),
            webhook_id,
            transaction_id,
            event_type,
            payload,
            status: DeliveryStatus::Pending,
            attempt_count: 0,
            response_code: None,
            error: None,
            next_retry_at: None,
            completed_at: None,
        }
    }
}
