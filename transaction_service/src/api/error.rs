use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::TransactionError;
use crate::webhook::error::WebhookError;

/// Unified error type for the transaction HTTP surface. The HTTP layer
/// itself is out of scope (§1); this conversion exists only so the thin
/// axum handlers below have somewhere to send domain errors, mirroring
/// `wallet_service::api::error::ApiError`.
pub enum ApiError {
    Transaction(TransactionError),
    Webhook(WebhookError),
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        ApiError::Transaction(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Transaction(e) => match e {
                TransactionError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                TransactionError::SenderWalletNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                TransactionError::ReceiverWalletNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                TransactionError::InvalidArg(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                TransactionError::InvalidStateTransition(_) => (StatusCode::CONFLICT, e.to_string()),
                TransactionError::PreconditionFailed(_) => (StatusCode::CONFLICT, e.to_string()),
                TransactionError::SimulatedFailure => (StatusCode::BAD_REQUEST, e.to_string()),
                TransactionError::RepositoryError(_) | TransactionError::Transient(_) => {
                    tracing::error!(error = %e, "transaction repository error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                }
            },
            ApiError::Webhook(e) => match e {
                WebhookError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                WebhookError::InvalidUrl(_) | WebhookError::InvalidData(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                WebhookError::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
                WebhookError::RepositoryError(_) => {
                    tracing::error!(error = %e, "webhook repository error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                }
            },
        };

        let body = Json(json!({ "status": "error", "message": message }));
        (status, body).into_response()
    }
}
