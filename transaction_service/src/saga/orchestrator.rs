//! Saga Orchestrator (E): the event reaction table of §4.5, restructured
//! from the teacher's synchronous `ProcessTransactionUseCase`
//! (save-then-call-wallet-then-finalize) into an event-driven dispatcher
//! that subscribes through `common::events::EventBus`, the way
//! `consumer_tasks.rs` subscribes per-subject.

use std::sync::Arc;

use common::events::{DomainEvent, EventBus, EventType};
use common::ids::{TransactionId, UserId};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::entities::{Transaction, TransactionStatus};
use crate::domain::error::TransactionError;
use crate::domain::gateways::WalletLedgerGateway;
use crate::domain::repository::TransactionRepository;
use crate::simulation::SimulationController;

pub struct SagaOrchestrator {
    transactions: Arc<dyn TransactionRepository>,
    wallets: Arc<dyn WalletLedgerGateway>,
    bus: Arc<dyn EventBus>,
    simulation: Arc<SimulationController>,
}

impl SagaOrchestrator {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        wallets: Arc<dyn WalletLedgerGateway>,
        bus: Arc<dyn EventBus>,
        simulation: Arc<SimulationController>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transactions,
            wallets,
            bus,
            simulation,
        })
    }

    /// Entry point (§4.5). Validates, persists `INITIATED`, and publishes
    /// `TRANSACTION_INITIATED`; the rest of the saga proceeds purely from
    /// event reactions.
    pub async fn initiate_transaction(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        amount: Decimal,
        currency: String,
        description: Option<String>,
    ) -> Result<Transaction, TransactionError> {
        if sender_id == receiver_id {
            return Err(TransactionError::InvalidArg(
                "sender and receiver must differ".into(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(TransactionError::InvalidArg("amount must be > 0".into()));
        }

        if !self.wallets.wallet_exists(sender_id).await? {
            return Err(TransactionError::SenderWalletNotFound(sender_id));
        }
        if !self.wallets.wallet_exists(receiver_id).await? {
            return Err(TransactionError::ReceiverWalletNotFound(receiver_id));
        }

        let transaction = Transaction::new(sender_id, receiver_id, amount, currency, description);
        let saved = self.transactions.create_transaction(transaction).await?;

        self.publish(EventType::TransactionInitiated, saved.id, json!({})).await;

        Ok(saved)
    }

    /// The 7 reaction-table handlers as `(EventType, Handler)` pairs,
    /// without subscribing them. Lets a caller compose these with another
    /// component's handler for the same event type (via
    /// `common::events::fanout`) before a single `subscribe` call — needed
    /// because the bus keeps at most one handler per event type and the
    /// notification dispatcher also reacts to `TRANSACTION_INITIATED` and
    /// `CREDIT_SUCCESS`.
    pub fn handlers(self: &Arc<Self>) -> Vec<(EventType, common::events::Handler)> {
        let this = self.clone();
        let on_initiated = handler(move |e| {
            let this = this.clone();
            async move { this.on_transaction_initiated(e).await }
        });
        let this = self.clone();
        let on_debit_success = handler(move |e| {
            let this = this.clone();
            async move { this.on_debit_success(e).await }
        });
        let this = self.clone();
        let on_debit_failed = handler(move |e| {
            let this = this.clone();
            async move { this.on_debit_failed(e).await }
        });
        let this = self.clone();
        let on_credit_success = handler(move |e| {
            let this = this.clone();
            async move { this.on_credit_success(e).await }
        });
        let this = self.clone();
        let on_credit_failed = handler(move |e| {
            let this = this.clone();
            async move { this.on_credit_failed(e).await }
        });
        let this = self.clone();
        let on_refund_completed = handler(move |e| {
            let this = this.clone();
            async move { this.on_refund_completed(e).await }
        });
        let this = self.clone();
        let on_refund_failed = handler(move |e| {
            let this = this.clone();
            async move { this.on_refund_failed(e).await }
        });

        vec![
            (EventType::TransactionInitiated, on_initiated),
            (EventType::DebitSuccess, on_debit_success),
            (EventType::DebitFailed, on_debit_failed),
            (EventType::CreditSuccess, on_credit_success),
            (EventType::CreditFailed, on_credit_failed),
            (EventType::RefundCompleted, on_refund_completed),
            (EventType::RefundFailed, on_refund_failed),
        ]
    }

    /// Registers all reactions from §4.5's table directly, with no other
    /// subscriber on the same event types. Prefer [`Self::handlers`] plus
    /// `common::events::fanout` when another component (e.g. the
    /// notification dispatcher) shares an event type with this saga.
    pub async fn wire(self: &Arc<Self>) -> Result<(), common::events::EventBusError> {
        let this = self.clone();
        self.bus
            .subscribe(
                EventType::TransactionInitiated,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_transaction_initiated(e).await }
                }),
            )
            .await?;

        let this = self.clone();
        self.bus
            .subscribe(
                EventType::DebitSuccess,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_debit_success(e).await }
                }),
            )
            .await?;

        let this = self.clone();
        self.bus
            .subscribe(
                EventType::DebitFailed,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_debit_failed(e).await }
                }),
            )
            .await?;

        let this = self.clone();
        self.bus
            .subscribe(
                EventType::CreditSuccess,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_credit_success(e).await }
                }),
            )
            .await?;

        let this = self.clone();
        self.bus
            .subscribe(
                EventType::CreditFailed,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_credit_failed(e).await }
                }),
            )
            .await?;

        let this = self.clone();
        self.bus
            .subscribe(
                EventType::RefundCompleted,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_refund_completed(e).await }
                }),
            )
            .await?;

        let this = self.clone();
        self.bus
            .subscribe(
                EventType::RefundFailed,
                handler(move |e| {
                    let this = this.clone();
                    async move { this.on_refund_failed(e).await }
                }),
            )
            .await?;

        Ok(())
    }

    async fn on_transaction_initiated(&self, event: DomainEvent) {
        let Some(txn) = self.load(event.transaction_id).await else { return };
        if let Err(e) = self.wallets.debit(txn.sender_id, txn.amount, txn.id).await {
            warn!(error = %e, transaction_id = %txn.id, "debit call failed outside the ledger's own failure event");
        }
    }

    /// `INITIATED -> DEBITED`, then immediately attempts the credit step
    /// (or the simulated-failure short-circuit of §4.5).
    async fn on_debit_success(&self, event: DomainEvent) {
        let txn = match self
            .transactions
            .update_transaction_if_status_in(
                event.transaction_id,
                &[TransactionStatus::Initiated],
                TransactionStatus::Debited,
                None,
            )
            .await
        {
            Ok(t) => t,
            Err(TransactionError::PreconditionFailed(_)) => {
                // A duplicate DEBIT_SUCCESS; benign (§4.5 ordering/tie-breaks).
                return;
            }
            Err(e) => {
                error!(error = %e, transaction_id = %event.transaction_id, "failed to mark transaction DEBITED");
                return;
            }
        };

        if self.simulation.should_fail(txn.id) {
            self.publish(
                EventType::CreditFailed,
                txn.id,
                json!({ "reason": "SIMULATED_FAILURE" }),
            )
            .await;
            return;
        }

        match self.wallets.credit(txn.receiver_id, txn.amount, txn.id).await {
            Ok(_) => self.publish(EventType::CreditSuccess, txn.id, json!({})).await,
            Err(e) => {
                warn!(error = %e, transaction_id = %txn.id, "credit attempt failed outside the ledger's own failure event");
            }
        }
    }

    async fn on_debit_failed(&self, event: DomainEvent) {
        let reason = event
            .payload
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("Insufficient balance")
            .to_string();

        match self
            .transactions
            .update_transaction_if_status_in(
                event.transaction_id,
                &[TransactionStatus::Initiated],
                TransactionStatus::Failed,
                Some(reason),
            )
            .await
        {
            Ok(_) => {
                self.publish(
                    EventType::TransactionFailed,
                    event.transaction_id,
                    json!({ "refunded": false }),
                )
                .await;
            }
            Err(TransactionError::PreconditionFailed(_)) => {}
            Err(e) => error!(error = %e, transaction_id = %event.transaction_id, "failed to mark transaction FAILED"),
        }
    }

    async fn on_credit_success(&self, event: DomainEvent) {
        match self
            .transactions
            .update_transaction_if_status_in(
                event.transaction_id,
                &[TransactionStatus::Debited],
                TransactionStatus::Completed,
                None,
            )
            .await
        {
            Ok(_) => {
                self.publish(EventType::TransactionCompleted, event.transaction_id, json!({}))
                    .await;
            }
            Err(TransactionError::PreconditionFailed(_)) => {}
            Err(e) => error!(error = %e, transaction_id = %event.transaction_id, "failed to mark transaction COMPLETED"),
        }
    }

    /// `DEBITED -> REFUNDING`, publishes `REFUND_REQUESTED`, then invokes
    /// the compensating refund.
    async fn on_credit_failed(&self, event: DomainEvent) {
        let txn = match self
            .transactions
            .update_transaction_if_status_in(
                event.transaction_id,
                &[TransactionStatus::Debited],
                TransactionStatus::Refunding,
                None,
            )
            .await
        {
            Ok(t) => t,
            Err(TransactionError::PreconditionFailed(_)) => return,
            Err(e) => {
                error!(error = %e, transaction_id = %event.transaction_id, "failed to mark transaction REFUNDING");
                return;
            }
        };

        self.publish(EventType::RefundRequested, txn.id, json!({})).await;

        if let Err(e) = self.wallets.refund(txn.sender_id, txn.amount, txn.id).await {
            warn!(error = %e, transaction_id = %txn.id, "refund attempt failed outside the ledger's own failure event");
        }
    }

    async fn on_refund_completed(&self, event: DomainEvent) {
        match self
            .transactions
            .update_transaction_if_status_in(
                event.transaction_id,
                &[TransactionStatus::Refunding],
                TransactionStatus::Failed,
                Some("Credit failed, amount refunded to sender".to_string()),
            )
            .await
        {
            Ok(_) => {
                self.publish(
                    EventType::TransactionFailed,
                    event.transaction_id,
                    json!({ "refunded": true }),
                )
                .await;
            }
            Err(TransactionError::PreconditionFailed(_)) => {}
            Err(e) => error!(error = %e, transaction_id = %event.transaction_id, "failed to mark transaction FAILED after refund"),
        }
    }

    /// No saga reaction by design (§9 Open Questions): a failed refund is
    /// an alertable inconsistency, not something this engine can safely
    /// auto-recover from.
    async fn on_refund_failed(&self, event: DomainEvent) {
        error!(
            transaction_id = %event.transaction_id,
            "REFUND_FAILED: transaction stuck in REFUNDING, requires operator attention"
        );
    }

    async fn load(&self, id: TransactionId) -> Option<Transaction> {
        match self.transactions.find_transaction(id).await {
            Ok(Some(t)) => Some(t),
            Ok(None) => {
                error!(transaction_id = %id, "event referenced a transaction that does not exist");
                None
            }
            Err(e) => {
                error!(error = %e, transaction_id = %id, "failed to load transaction for event reaction");
                None
            }
        }
    }

    async fn publish(&self, event_type: EventType, transaction_id: TransactionId, payload: serde_json::Value) {
        let event = DomainEvent::new(event_type, transaction_id, payload);
        if let Err(e) = self.bus.publish(event).await {
            warn!(error = %e, %event_type, "failed to publish saga event");
        }
    }
}

/// Wraps an async closure into the `Handler` shape the event bus expects.
fn handler<F, Fut>(f: F) -> common::events::Handler
where
    F: Fn(DomainEvent) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)) as common::events::HandlerFuture)
}
