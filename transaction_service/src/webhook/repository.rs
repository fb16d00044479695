//! Webhook subscription + delivery persistence port, shaped after
//! `wallet_service`'s `WalletRepository`/`UserRepository` trait-plus-impl
//! split: one trait, a Postgres implementation for production, an
//! in-memory implementation for tests.

use async_trait::async_trait;
use common::events::EventType;
use common::ids::{DeliveryId, UserId, WebhookId};

use crate::webhook::entities::{WebhookDelivery, WebhookSubscription};
use crate::webhook::error::WebhookError;

#[async_trait]
pub trait WebhookRepository: Send + Sync {
    async fn create_subscription(&self, sub: WebhookSubscription) -> Result<WebhookSubscription, WebhookError>;
    async fn get_subscription(&self, id: WebhookId) -> Result<Option<WebhookSubscription>, WebhookError>;
    async fn find_by_user_and_url(&self, user_id: UserId, url: &str) -> Result<Option<WebhookSubscription>, WebhookError>;
    async fn list_subscriptions(&self, user_id: UserId) -> Result<Vec<WebhookSubscription>, WebhookError>;
    async fn update_subscription(&self, sub: WebhookSubscription) -> Result<WebhookSubscription, WebhookError>;
    async fn delete_subscription(&self, id: WebhookId) -> Result<(), WebhookError>;

    /// Active subscriptions whose `events[]` contains `event_type` (§4.7
    /// step 1).
    async fn find_active_for_event(&self, event_type: EventType) -> Result<Vec<WebhookSubscription>, WebhookError>;

    async fn create_delivery(&self, delivery: WebhookDelivery) -> Result<WebhookDelivery, WebhookError>;
    async fn update_delivery(&self, delivery: WebhookDelivery) -> Result<WebhookDelivery, WebhookError>;
    async fn list_deliveries(&self, webhook_id: WebhookId) -> Result<Vec<WebhookDelivery>, WebhookError>;
    async fn get_delivery(&self, id: DeliveryId) -> Result<Option<WebhookDelivery>, WebhookError>;
}
