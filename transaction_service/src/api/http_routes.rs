//! Thin axum surface over the transaction core. HTTP routing itself is out
//! of scope (§1); these handlers exist only to expose the in-process
//! contracts of §6 the way the teacher's `http_routes.rs` exposed its use
//! cases, generalized onto the saga/use-case/webhook/simulation surface.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use common::ids::{TransactionId, UserId, WebhookId};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::domain::entities::TransactionStatus;
use crate::saga::orchestrator::SagaOrchestrator;
use crate::simulation::{SimulationConfig, SimulationController};
use crate::use_cases::get_transaction_details::GetTransactionDetailsUseCase;
use crate::use_cases::list_transactions::{ListTransactionsUseCase, TransactionPage};
use crate::webhook::entities::WebhookSubscription;
use crate::webhook::repository::WebhookRepository;

pub struct AppState {
    pub saga: Arc<SagaOrchestrator>,
    pub get_transaction: GetTransactionDetailsUseCase,
    pub list_transactions: ListTransactionsUseCase,
    pub webhooks: Arc<dyn WebhookRepository>,
    pub simulation: Arc<SimulationController>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/transactions", post(initiate_transaction))
        .route("/transactions/{id}", get(get_transaction_details))
        .route("/users/{user_id}/transactions", get(list_transactions))
        .route("/webhooks", post(create_subscription).get(list_subscriptions))
        .route(
            "/webhooks/{id}",
            get(get_subscription).patch(update_subscription).delete(delete_subscription),
        )
        .route("/webhooks/{id}/deliveries", get(get_delivery_logs))
        .route("/simulation", get(get_simulation_config).post(set_simulation_config))
        .route("/simulation/reset", post(reset_simulation))
        .with_state(state)
}

// --- transactions (§6 initiateTransaction / getTransaction / listTransactions) ---

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub description: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

pub async fn initiate_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<Json<ApiResponse<crate::domain::entities::Transaction>>, ApiError> {
    let txn = state
        .saga
        .initiate_transaction(req.sender_id, req.receiver_id, req.amount, req.currency, req.description)
        .await?;
    Ok(Json(ApiResponse::success(txn)))
}

pub async fn get_transaction_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TransactionId>,
) -> Result<Json<ApiResponse<crate::domain::entities::Transaction>>, ApiError> {
    let txn = state.get_transaction.execute(id).await?;
    Ok(Json(ApiResponse::success(txn)))
}

#[derive(Deserialize)]
pub struct ListTransactionsQuery {
    pub status: Option<TransactionStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Query(q): Query<ListTransactionsQuery>,
) -> Result<Json<ApiResponse<TransactionPage>>, ApiError> {
    let page = state
        .list_transactions
        .execute(user_id, q.status, q.limit, q.offset)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

// --- webhook subscription CRUD + delivery logs (§6) ---

#[derive(Deserialize)]
pub struct CreateWebhookRequest {
    pub user_id: UserId,
    pub url: String,
    pub secret: String,
    pub events: Vec<common::events::EventType>,
}

pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWebhookRequest>,
) -> Result<Json<ApiResponse<WebhookSubscription>>, ApiError> {
    if state.webhooks.find_by_user_and_url(req.user_id, &req.url).await?.is_some() {
        return Err(crate::webhook::error::WebhookError::Conflict(req.user_id).into());
    }
    let sub = WebhookSubscription::new(req.user_id, req.url, req.secret, req.events)?;
    let saved = state.webhooks.create_subscription(sub).await?;
    Ok(Json(ApiResponse::success(saved)))
}

#[derive(Deserialize)]
pub struct ListWebhooksQuery {
    pub user_id: UserId,
}

pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListWebhooksQuery>,
) -> Result<Json<ApiResponse<Vec<WebhookSubscription>>>, ApiError> {
    let subs = state.webhooks.list_subscriptions(q.user_id).await?;
    Ok(Json(ApiResponse::success(subs)))
}

pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WebhookId>,
) -> Result<Json<ApiResponse<WebhookSubscription>>, ApiError> {
    let sub = state
        .webhooks
        .get_subscription(id)
        .await?
        .ok_or(crate::webhook::error::WebhookError::NotFound(id))?;
    Ok(Json(ApiResponse::success(sub)))
}

#[derive(Deserialize)]
pub struct UpdateWebhookRequest {
    pub url: Option<String>,
    pub secret: Option<String>,
    pub events: Option<Vec<common::events::EventType>>,
    pub is_active: Option<bool>,
}

pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WebhookId>,
    Json(req): Json<UpdateWebhookRequest>,
) -> Result<Json<ApiResponse<WebhookSubscription>>, ApiError> {
    let mut sub = state
        .webhooks
        .get_subscription(id)
        .await?
        .ok_or(crate::webhook::error::WebhookError::NotFound(id))?;

    if let Some(url) = req.url {
        if !url.starts_with("https://") {
            return Err(crate::webhook::error::WebhookError::InvalidUrl(url).into());
        }
        sub.url = url;
    }
    if let Some(secret) = req.secret {
        if secret.len() < crate::webhook::entities::MIN_SECRET_LEN {
            return Err(crate::webhook::error::WebhookError::InvalidData(format!(
                "secret must be at least {} bytes",
                crate::webhook::entities::MIN_SECRET_LEN
            ))
            .into());
        }
        sub.secret = secret;
    }
    if let Some(events) = req.events {
        sub.events = events;
    }
    if let Some(is_active) = req.is_active {
        sub.is_active = is_active;
    }

    let saved = state.webhooks.update_subscription(sub).await?;
    Ok(Json(ApiResponse::success(saved)))
}

pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WebhookId>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.webhooks.delete_subscription(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn get_delivery_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WebhookId>,
) -> Result<Json<ApiResponse<Vec<crate::webhook::entities::WebhookDelivery>>>, ApiError> {
    let deliveries = state.webhooks.list_deliveries(id).await?;
    Ok(Json(ApiResponse::success(deliveries)))
}

// --- simulation admin (§4.5, §6) ---

pub async fn get_simulation_config(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SimulationConfig>> {
    Json(ApiResponse::success(state.simulation.get()))
}

pub async fn set_simulation_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SimulationConfig>,
) -> Json<ApiResponse<SimulationConfig>> {
    state.simulation.set(config.clone());
    Json(ApiResponse::success(config))
}

pub async fn reset_simulation(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SimulationConfig>> {
    state.simulation.reset();
    Json(ApiResponse::success(state.simulation.get()))
}
