use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

use crate::domain::error::{UserError, WalletError};

/// Unified error type for the wallet HTTP surface. The HTTP layer itself is
/// out of scope (§1); this conversion exists only so the thin axum handlers
/// below have somewhere to send domain errors.
pub enum ApiError {
    User(UserError),
    Wallet(WalletError),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        ApiError::User(err)
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        ApiError::Wallet(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::User(e) => match e {
                UserError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                UserError::EmailTaken(_) => (StatusCode::CONFLICT, e.to_string()),
                UserError::InvalidData(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                UserError::RepositoryError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                }
            },
            ApiError::Wallet(e) => match e {
                WalletError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                WalletError::UserNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                WalletError::InvalidData(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                WalletError::InsufficientBalance(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                WalletError::PreconditionFailed(_) => (StatusCode::CONFLICT, e.to_string()),
                WalletError::RepositoryError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                }
            },
        };

        let body = Json(json!({ "status": "error", "message": message }));
        (status, body).into_response()
    }
}
