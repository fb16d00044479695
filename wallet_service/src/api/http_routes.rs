//! Thin axum surface over the wallet core. HTTP routing itself is out of
//! scope (§1); these handlers exist only to expose the in-process contracts
//! of §6 (`wallet.deposit`, `wallet.getBalance`, `wallet.history`) the way
//! the teacher's `http_routes.rs` exposed its use cases, generalized from
//! stub TODO handlers into real ones.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use common::ids::UserId;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::domain::entities::{User, Wallet};
use crate::domain::repository::{UserRepository, WalletRepository};
use crate::ledger::WalletLedger;

pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub wallet_repo: Arc<dyn WalletRepository>,
    pub ledger: WalletLedger,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/wallets", post(create_wallet))
        .route("/wallets/{user_id}/balance", get(get_balance))
        .route("/wallets/{user_id}/history", get(get_history))
        .route("/wallets/{user_id}/deposit", post(deposit))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = User::new(req.name, req.email)?;
    let saved = state.user_repo.create(user).await?;
    Ok(Json(ApiResponse::success(saved)))
}

#[derive(Deserialize)]
pub struct CreateWalletRequest {
    pub user_id: UserId,
    pub currency: String,
}

pub async fn create_wallet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<Json<ApiResponse<Wallet>>, ApiError> {
    let wallet = Wallet::builder()
        .user_id(req.user_id)
        .currency(req.currency)
        .build()?;
    let saved = state.wallet_repo.create(wallet).await?;
    Ok(Json(ApiResponse::success(saved)))
}

pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<Decimal>>, ApiError> {
    let balance = state.ledger.get_balance(user_id).await?;
    Ok(Json(ApiResponse::success(balance)))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<Vec<crate::domain::entities::WalletOperation>>>, ApiError> {
    let ops = state.ledger.history(user_id, 50).await?;
    Ok(Json(ApiResponse::success(ops)))
}

#[derive(Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
    pub client_key: String,
}

pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<ApiResponse<crate::ledger::OperationResult>>, ApiError> {
    let result = state.ledger.deposit(user_id, req.amount, &req.client_key).await?;
    Ok(Json(ApiResponse::success(result)))
}
