use std::sync::Arc;

use axum::Router;
use common::config::AppConfig;
use common::events::EventBus;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use wallet_service::{
    api::http_routes::{routes, AppState},
    infrastructure::persistence::{
        user_repository::PostgresUserRepository, wallet_repository::PostgresWalletRepository,
    },
    ledger::WalletLedger,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::telemetry::init("wallet_service");
    let config = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    info!("connected to database");

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let wallet_repo = Arc::new(PostgresWalletRepository::new(pool.clone()));

    let bus = Arc::new(common::events::InMemoryEventBus::new());
    bus.connect().await?;
    let ledger = WalletLedger::new(wallet_repo.clone(), bus.clone());

    let app_state = Arc::new(AppState {
        user_repo,
        wallet_repo,
        ledger,
    });

    let app: Router = routes(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "wallet_service listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
