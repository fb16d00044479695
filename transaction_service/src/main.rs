use std::sync::Arc;

use common::config::AppConfig;
use common::events::{fanout, EventBus, InMemoryEventBus};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use transaction_service::{
    api::http_routes::{routes, AppState},
    infrastructure::{
        gateways::in_process_wallet_gateway::InProcessWalletLedgerGateway,
        persistence::transaction_repository::PostgresTransactionRepository,
    },
    jobs::{
        queue::JobQueue,
        reconciler::StuckTransactionReconciler,
    },
    notifications::dispatcher::{NotificationDispatcher, NotificationDispatcherConfig},
    saga::orchestrator::SagaOrchestrator,
    simulation::SimulationController,
    use_cases::{
        get_transaction_details::GetTransactionDetailsUseCase,
        list_transactions::ListTransactionsUseCase,
    },
    webhook::{
        dispatcher::{WebhookDeliveryJob, WebhookDispatcher, WebhookDispatcherConfig},
        postgres::PostgresWebhookRepository,
    },
};
use wallet_service::{
    infrastructure::persistence::wallet_repository::PostgresWalletRepository, ledger::WalletLedger,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::telemetry::init("transaction_service");
    let config = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    info!("connected to database");

    // Shared bus: the saga's `WalletLedgerGateway` calls `WalletLedger` in
    // process (§1 - HTTP/gRPC between the two services is out of scope), so
    // both sides of the saga must observe events on the same bus instance.
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    bus.connect().await?;

    let wallet_repo = Arc::new(PostgresWalletRepository::new(pool.clone()));
    let wallet_ledger = Arc::new(WalletLedger::new(wallet_repo.clone(), bus.clone()));

    let transaction_repo = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let webhook_repo: Arc<dyn transaction_service::webhook::repository::WebhookRepository> =
        Arc::new(PostgresWebhookRepository::new(pool.clone()));

    let wallet_gateway = Arc::new(InProcessWalletLedgerGateway::new(wallet_ledger.clone()));
    let simulation = Arc::new(SimulationController::new());

    let saga = SagaOrchestrator::new(
        transaction_repo.clone(),
        wallet_gateway.clone(),
        bus.clone(),
        simulation.clone(),
    );

    let webhook_queue = Arc::new(JobQueue::<WebhookDeliveryJob>::new(
        config.job_queue.remove_on_complete,
        config.job_queue.remove_on_fail,
    ));
    let webhook_dispatcher = WebhookDispatcher::new(
        webhook_repo.clone(),
        transaction_repo.clone(),
        bus.clone(),
        webhook_queue,
        WebhookDispatcherConfig {
            attempts: config.job_queue.webhook_attempts,
            base_delay: config.job_queue.webhook_base_delay,
            request_timeout: config.webhook.request_timeout,
            auto_deactivate_after_failures: config.webhook.auto_deactivate_after_failures,
        },
    );
    webhook_dispatcher.spawn_workers(4);

    let notification_queue = Arc::new(JobQueue::new(
        config.job_queue.remove_on_complete,
        config.job_queue.remove_on_fail,
    ));
    let notification_dispatcher = NotificationDispatcher::new(
        transaction_repo.clone(),
        bus.clone(),
        notification_queue,
        NotificationDispatcherConfig {
            attempts: config.job_queue.notification_attempts,
            base_delay: config.job_queue.notification_base_delay,
        },
    );
    notification_dispatcher.spawn_workers(4);

    // The saga, webhook dispatcher, and notification dispatcher all react to
    // some of the same event types (e.g. `CREDIT_SUCCESS`,
    // `TRANSACTION_COMPLETED`, `TRANSACTION_FAILED`). The bus keeps at most
    // one handler per event type (§4.1), so their reaction tables are merged
    // with `fanout` per event type instead of each component calling its own
    // `wire()`.
    let mut merged: std::collections::HashMap<common::events::EventType, Vec<common::events::Handler>> =
        std::collections::HashMap::new();
    for (event_type, handler) in saga.handlers() {
        merged.entry(event_type).or_default().push(handler);
    }
    for (event_type, handler) in webhook_dispatcher.handlers() {
        merged.entry(event_type).or_default().push(handler);
    }
    for (event_type, handler) in notification_dispatcher.handlers() {
        merged.entry(event_type).or_default().push(handler);
    }
    for (event_type, handlers) in merged {
        bus.subscribe(event_type, fanout(handlers)).await?;
    }

    let reconciler = Arc::new(StuckTransactionReconciler::new(
        transaction_repo.clone(),
        bus.clone(),
        config.reconciler.stuck_after,
    ));
    tokio::spawn(reconciler.run_forever(config.reconciler.sweep_interval));

    let app_state = Arc::new(AppState {
        saga,
        get_transaction: GetTransactionDetailsUseCase::new(transaction_repo.clone()),
        list_transactions: ListTransactionsUseCase::new(transaction_repo.clone()),
        webhooks: webhook_repo,
        simulation,
    });

    let app = routes(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "transaction_service listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
