use common::error::CoreError;
use common::ids::{UserId, WebhookId};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum WebhookError {
    #[error("webhook subscription not found: {0}")]
    NotFound(WebhookId),

    #[error("webhook url must be https: {0}")]
    InvalidUrl(String),

    #[error("invalid webhook data: {0}")]
    InvalidData(String),

    #[error("a subscription already exists for user {0} and this url")]
    Conflict(UserId),

    #[error("repository error: {0}")]
    RepositoryError(String),
}

impl From<WebhookError> for CoreError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::NotFound(id) => CoreError::NotFound(format!("webhook subscription {}", id)),
            WebhookError::InvalidUrl(e) => CoreError::InvalidArg(format!("url must be https: {}", e)),
            WebhookError::InvalidData(e) => CoreError::InvalidArg(e),
            WebhookError::Conflict(id) => CoreError::Conflict(format!("subscription already exists for user {}", id)),
            WebhookError::RepositoryError(e) => CoreError::Transient(e),
        }
    }
}
