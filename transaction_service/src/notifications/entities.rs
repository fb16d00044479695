//! Notification job entity (§4.8). Grounded on the webhook module's own
//! job-payload shape (`webhook::dispatcher::WebhookDeliveryJob`),
//! generalized since the source specifies a notification as a plain fan-out
//! record rather than a persisted entity with its own lifecycle.

use common::ids::{NotificationId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four user-facing moments the source calls out (§4.8): a transfer
/// started, completed, or failed, and a transfer landed in the receiver's
/// wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    TransferInitiated,
    TransferCompleted,
    TransferFailed,
    FundsReceived,
}

/// `{notificationId, userId, type, title, message, data}` (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub notification_id: NotificationId,
    pub user_id: UserId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Value,
}
