//! End-to-end saga scenarios from spec §8 (S1-S4), run against the
//! in-memory repositories on both sides of the workspace boundary with the
//! saga fully wired onto one `InMemoryEventBus`, the way S1-S6 are phrased
//! as two-user (Alice, Bob) scenarios in the source.

use std::sync::Arc;

use common::events::{EventBus, EventType, InMemoryEventBus};
use common::ids::UserId;
use rust_decimal::Decimal;
use transaction_service::domain::entities::{Transaction, TransactionStatus};
use transaction_service::domain::repository::TransactionRepository;
use transaction_service::infrastructure::gateways::fake_wallet_gateway::FakeWalletLedgerGateway;
use transaction_service::infrastructure::gateways::in_process_wallet_gateway::InProcessWalletLedgerGateway;
use transaction_service::infrastructure::persistence::in_memory::InMemoryTransactionRepository;
use transaction_service::saga::orchestrator::SagaOrchestrator;
use transaction_service::simulation::SimulationController;
use wallet_service::domain::entities::{User, Wallet};
use wallet_service::domain::repository::{UserRepository, WalletRepository};
use wallet_service::infrastructure::persistence::in_memory::{
    InMemoryUserRepository, InMemoryWalletRepository,
};
use wallet_service::ledger::WalletLedger;

/// Wires a full saga (wallet ledger + transaction repository + orchestrator)
/// onto a single in-process bus, with Alice and Bob each holding a zero-balance
/// USD wallet, matching every S1-S6 scenario's setup.
struct Harness {
    bus: Arc<dyn EventBus>,
    ledger: Arc<WalletLedger>,
    transactions: Arc<InMemoryTransactionRepository>,
    saga: Arc<SagaOrchestrator>,
    simulation: Arc<SimulationController>,
    alice: UserId,
    bob: UserId,
}

async fn harness() -> Harness {
    let user_repo = Arc::new(InMemoryUserRepository::new());
    let wallet_repo = Arc::new(InMemoryWalletRepository::new());
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    bus.connect().await.unwrap();

    let alice = User::new("Alice".to_string(), "alice@example.com".to_string()).unwrap();
    let alice = user_repo.create(alice).await.unwrap();
    let bob = User::new("Bob".to_string(), "bob@example.com".to_string()).unwrap();
    let bob = user_repo.create(bob).await.unwrap();

    for user in [&alice, &bob] {
        let wallet = Wallet::builder()
            .user_id(user.id())
            .currency("USD".to_string())
            .build()
            .unwrap();
        wallet_repo.create(wallet).await.unwrap();
    }

    let ledger = Arc::new(WalletLedger::new(wallet_repo.clone(), bus.clone()));
    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let wallet_gateway = Arc::new(InProcessWalletLedgerGateway::new(ledger.clone()));
    let simulation = Arc::new(SimulationController::new());

    let saga = SagaOrchestrator::new(
        transactions.clone(),
        wallet_gateway,
        bus.clone(),
        simulation.clone(),
    );
    saga.wire().await.unwrap();

    Harness {
        bus,
        ledger,
        transactions,
        saga,
        simulation,
        alice: alice.id(),
        bob: bob.id(),
    }
}

#[tokio::test]
async fn s1_happy_transfer_completes_and_moves_the_balance() {
    let h = harness().await;
    h.ledger.deposit(h.alice, Decimal::new(1000, 0), "seed").await.unwrap();

    let txn = h
        .saga
        .initiate_transaction(h.alice, h.bob, Decimal::new(100, 0), "USD".to_string(), None)
        .await
        .unwrap();

    let txn = h.transactions.find_transaction(txn.id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Completed);
    assert_eq!(h.ledger.get_balance(h.alice).await.unwrap(), Decimal::new(900, 0));
    assert_eq!(h.ledger.get_balance(h.bob).await.unwrap(), Decimal::new(100, 0));

    let history = h.ledger.history(h.alice, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, common::events::OperationKind::Debit);
}

#[tokio::test]
async fn s2_insufficient_balance_fails_without_a_debit_row() {
    let h = harness().await;
    h.ledger.deposit(h.alice, Decimal::new(100, 0), "seed").await.unwrap();

    let txn = h
        .saga
        .initiate_transaction(h.alice, h.bob, Decimal::new(500, 0), "USD".to_string(), None)
        .await
        .unwrap();

    let txn = h.transactions.find_transaction(txn.id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Failed);
    assert!(txn
        .failure_reason
        .as_deref()
        .unwrap_or_default()
        .to_lowercase()
        .contains("insufficient"));
    assert_eq!(h.ledger.get_balance(h.alice).await.unwrap(), Decimal::new(100, 0));
    assert_eq!(h.ledger.get_balance(h.bob).await.unwrap(), Decimal::ZERO);
    assert!(h.ledger.history(h.alice, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn s3_credit_failure_compensates_with_a_refund() {
    let h = harness().await;
    h.ledger.deposit(h.alice, Decimal::new(500, 0), "seed").await.unwrap();

    h.simulation.set(transaction_service::simulation::SimulationConfig {
        enabled: true,
        failure_rate: 1.0,
        fail_transaction_ids: Default::default(),
    });

    let txn = h
        .saga
        .initiate_transaction(h.alice, h.bob, Decimal::new(200, 0), "USD".to_string(), None)
        .await
        .unwrap();

    let txn = h.transactions.find_transaction(txn.id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Failed);
    assert!(txn
        .failure_reason
        .as_deref()
        .unwrap_or_default()
        .to_lowercase()
        .contains("refunded"));
    assert_eq!(h.ledger.get_balance(h.alice).await.unwrap(), Decimal::new(500, 0));
    assert_eq!(h.ledger.get_balance(h.bob).await.unwrap(), Decimal::ZERO);

    let history = h.ledger.history(h.alice, 10).await.unwrap();
    let kinds: Vec<_> = history.iter().map(|op| op.kind).collect();
    assert!(kinds.contains(&common::events::OperationKind::Debit));
    assert!(kinds.contains(&common::events::OperationKind::Refund));
}

#[tokio::test]
async fn s4_duplicate_debit_success_applies_credit_exactly_once() {
    let h = harness().await;
    h.ledger.deposit(h.alice, Decimal::new(1000, 0), "seed").await.unwrap();

    let txn = Transaction::new(h.alice, h.bob, Decimal::new(100, 0), "USD".to_string(), None);
    let txn = h.transactions.create_transaction(txn).await.unwrap();

    // `debit` publishes DEBIT_SUCCESS once, driving the saga's real
    // DEBITED -> COMPLETED reaction. Re-publish the same event by hand to
    // simulate the at-least-once redelivery S4 exercises; the saga's
    // `updateTransactionIfStatusIn` guard and the ledger's operation-row
    // idempotency must make the second delivery a no-op.
    h.ledger.debit(h.alice, txn.amount, txn.id).await.unwrap();
    let duplicate = common::events::DomainEvent::new(EventType::DebitSuccess, txn.id, serde_json::json!({}));
    h.bus.publish(duplicate).await.unwrap();

    let txn = h.transactions.find_transaction(txn.id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Completed);
    assert_eq!(h.ledger.get_balance(h.alice).await.unwrap(), Decimal::new(900, 0));
    assert_eq!(h.ledger.get_balance(h.bob).await.unwrap(), Decimal::new(100, 0));

    let history = h.ledger.history(h.bob, 10).await.unwrap();
    assert_eq!(history.len(), 1, "exactly one CREDIT row despite the duplicated event");
}

/// Exercises the saga's own state-machine transitions in isolation from
/// ledger arithmetic, against `FakeWalletLedgerGateway` (an always-succeeds
/// double) instead of a real `WalletLedger` — no wallets are created at
/// all, since the fake reports every wallet as existing and every
/// debit/credit/refund as successful.
#[tokio::test]
async fn saga_drives_initiated_to_completed_against_a_fake_wallet_gateway() {
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    bus.connect().await.unwrap();

    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let wallet_gateway = Arc::new(FakeWalletLedgerGateway::new());
    let simulation = Arc::new(SimulationController::new());

    let saga = SagaOrchestrator::new(transactions.clone(), wallet_gateway, bus.clone(), simulation);
    saga.wire().await.unwrap();

    let alice = UserId::new();
    let bob = UserId::new();
    let txn = saga
        .initiate_transaction(alice, bob, Decimal::new(50, 0), "USD".to_string(), None)
        .await
        .unwrap();

    let txn = transactions.find_transaction(txn.id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Completed);
}
