//! Stuck-transaction reconciler, the periodic sweep §9's Design Notes
//! invite ("implementers SHOULD add a periodic reconciler ... re-publish
//! based on persisted state"). Modeled directly on the teacher's
//! `RetryFailedTransactionJob` (`find_pending_older_than` + per-row
//! recovery loop), retargeted at re-publishing the event the saga would
//! have reacted to next rather than calling a gateway directly, since the
//! saga's own event reactions are already idempotent (§4.5).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::events::{DomainEvent, EventBus, EventType};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::TransactionStatus;
use crate::domain::repository::TransactionRepository;

/// Re-publishes `TRANSACTION_INITIATED` for transactions stuck in
/// `INITIATED` and `DEBIT_SUCCESS` for transactions stuck in `DEBITED`,
/// older than `stuck_after`. Safe to run concurrently with the saga: every
/// reaction it triggers goes through the same `updateTransactionIfStatusIn`
/// guard and wallet-operation idempotency the saga itself relies on.
pub struct StuckTransactionReconciler {
    transactions: Arc<dyn TransactionRepository>,
    bus: Arc<dyn EventBus>,
    stuck_after: Duration,
}

impl StuckTransactionReconciler {
    pub fn new(transactions: Arc<dyn TransactionRepository>, bus: Arc<dyn EventBus>, stuck_after: Duration) -> Self {
        Self {
            transactions,
            bus,
            stuck_after,
        }
    }

    /// Runs one sweep. Call on a `tokio::time::interval` tick from `main`.
    pub async fn run_once(&self) {
        let older_than = Utc::now() - chrono::Duration::from_std(self.stuck_after).unwrap_or(chrono::Duration::seconds(60));

        let stuck = match self
            .transactions
            .list_stuck_transactions(&[TransactionStatus::Initiated, TransactionStatus::Debited], older_than)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "reconciler failed to list stuck transactions");
                return;
            }
        };

        if stuck.is_empty() {
            return;
        }
        info!(count = stuck.len(), "reconciler re-publishing events for stuck transactions");

        for txn in stuck {
            let (event_type, payload) = match txn.status {
                TransactionStatus::Initiated => (EventType::TransactionInitiated, json!({})),
                TransactionStatus::Debited => (EventType::DebitSuccess, json!({})),
                _ => continue,
            };

            let event = DomainEvent::new(event_type, txn.id, payload);
            if let Err(e) = self.bus.publish(event).await {
                warn!(error = %e, transaction_id = %txn.id, %event_type, "reconciler failed to re-publish event");
            }
        }
    }

    /// Runs `run_once` on `sweep_interval`, forever. Spawn with
    /// `tokio::spawn` from `main`.
    pub async fn run_forever(self: Arc<Self>, sweep_interval: Duration) {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Transaction;
    use crate::infrastructure::persistence::in_memory::InMemoryTransactionRepository;
    use common::events::InMemoryEventBus;
    use common::ids::UserId;
    use rust_decimal::Decimal;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn republishes_transaction_initiated_for_stuck_transactions() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        bus.connect().await.unwrap();

        let mut txn = Transaction::new(UserId::new(), UserId::new(), Decimal::new(50, 0), "USD".to_string(), None);
        txn.initiated_at = Utc::now() - chrono::Duration::minutes(5);
        let txn = repo.create_transaction(txn).await.unwrap();

        let seen: Arc<StdMutex<Vec<EventType>>> = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let handler: common::events::Handler = Arc::new(move |event| {
            let seen = seen_clone.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(event.event_type);
            })
        });
        bus.subscribe(EventType::TransactionInitiated, handler).await.unwrap();

        let reconciler = StuckTransactionReconciler::new(repo, bus, Duration::from_secs(60));
        reconciler.run_once().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], EventType::TransactionInitiated);
        let _ = txn.id;
    }
}
