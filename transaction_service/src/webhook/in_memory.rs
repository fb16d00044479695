use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::events::EventType;
use common::ids::{DeliveryId, UserId, WebhookId};

use crate::webhook::entities::{WebhookDelivery, WebhookSubscription};
use crate::webhook::error::WebhookError;
use crate::webhook::repository::WebhookRepository;

#[derive(Default)]
pub struct InMemoryWebhookRepository {
    subscriptions: Mutex<HashMap<WebhookId, WebhookSubscription>>,
    deliveries: Mutex<HashMap<DeliveryId, WebhookDelivery>>,
}

impl InMemoryWebhookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookRepository for InMemoryWebhookRepository {
    async fn create_subscription(&self, sub: WebhookSubscription) -> Result<WebhookSubscription, WebhookError> {
        let mut subs = self.subscriptions.lock().unwrap();
        if subs
            .values()
            .any(|s| s.user_id == sub.user_id && s.url == sub.url)
        {
            return Err(WebhookError::Conflict(sub.user_id));
        }
        subs.insert(sub.webhook_id, sub.clone());
        Ok(sub)
    }

    async fn get_subscription(&self, id: WebhookId) -> Result<Option<WebhookSubscription>, WebhookError> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_user_and_url(&self, user_id: UserId, url: &str) -> Result<Option<WebhookSubscription>, WebhookError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.user_id == user_id && s.url == url)
            .cloned())
    }

    async fn list_subscriptions(&self, user_id: UserId) -> Result<Vec<WebhookSubscription>, WebhookError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_subscription(&self, sub: WebhookSubscription) -> Result<WebhookSubscription, WebhookError> {
        let mut subs = self.subscriptions.lock().unwrap();
        if !subs.contains_key(&sub.webhook_id) {
            return Err(WebhookError::NotFound(sub.webhook_id));
        }
        subs.insert(sub.webhook_id, sub.clone());
        Ok(sub)
    }

    async fn delete_subscription(&self, id: WebhookId) -> Result<(), WebhookError> {
        self.subscriptions
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or(WebhookError::NotFound(id))?;
        Ok(())
    }

    async fn find_active_for_event(&self, event_type: EventType) -> Result<Vec<WebhookSubscription>, WebhookError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.wants(event_type))
            .cloned()
            .collect())
    }

    async fn create_delivery(&self, delivery: WebhookDelivery) -> Result<WebhookDelivery, WebhookError> {
        let mut deliveries = self.deliveries.lock().unwrap();
        deliveries.insert(delivery.delivery_id.clone(), delivery.clone());
        Ok(delivery)
    }

    async fn update_delivery(&self, delivery: WebhookDelivery) -> Result<WebhookDelivery, WebhookError> {
        let mut deliveries = self.deliveries.lock().unwrap();
        deliveries.insert(delivery.delivery_id.clone(), delivery.clone());
        Ok(delivery)
    }

    async fn list_deliveries(&self, webhook_id: WebhookId) -> Result<Vec<WebhookDelivery>, WebhookError> {
        Ok(self
            .deliveries
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.webhook_id == webhook_id)
            .cloned()
            .collect())
    }

    async fn get_delivery(&self, id: DeliveryId) -> Result<Option<WebhookDelivery>, WebhookError> {
        Ok(self.deliveries.lock().unwrap().get(&id).cloned())
    }
}
