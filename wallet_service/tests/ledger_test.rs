//! Ledger-level tests of spec §8 properties 2 (non-negativity), 3
//! (at-most-once effect) and 6 (idempotent deposits), run against the
//! in-memory repository so concurrent interleaving is exercised without a
//! database, per SPEC_FULL.md's test-tooling section.

use std::sync::Arc;

use common::events::InMemoryEventBus;
use common::ids::UserId;
use rust_decimal::Decimal;
use wallet_service::domain::entities::{User, Wallet};
use wallet_service::domain::repository::{UserRepository, WalletRepository};
use wallet_service::infrastructure::persistence::in_memory::{
    InMemoryUserRepository, InMemoryWalletRepository,
};
use wallet_service::ledger::WalletLedger;

async fn new_ledger_with_wallet(initial_balance: Decimal) -> (WalletLedger, UserId, Arc<InMemoryWalletRepository>) {
    let user_repo = Arc::new(InMemoryUserRepository::new());
    let wallet_repo = Arc::new(InMemoryWalletRepository::new());
    let bus = Arc::new(InMemoryEventBus::new());
    use common::events::EventBus;
    bus.connect().await.unwrap();

    let user = User::new("Alice".to_string(), "alice@example.com".to_string()).unwrap();
    let user = user_repo.create(user).await.unwrap();

    let wallet = Wallet::builder()
        .user_id(user.id())
        .currency("USD".to_string())
        .build()
        .unwrap();
    let wallet = wallet_repo.create(wallet).await.unwrap();

    if initial_balance > Decimal::ZERO {
        wallet_repo
            .conditional_increment_balance(
                wallet.id(),
                initial_balance,
                wallet_service::domain::repository::BalancePredicate::Unconditional,
            )
            .await
            .unwrap();
    }

    let ledger = WalletLedger::new(wallet_repo.clone(), bus);
    (ledger, user.id(), wallet_repo)
}

#[tokio::test]
async fn idempotent_deposit_applies_amount_exactly_once() {
    let (ledger, user_id, _repo) = new_ledger_with_wallet(Decimal::ZERO).await;

    let first = ledger.deposit(user_id, Decimal::new(500, 0), "k1").await.unwrap();
    assert!(!first.idempotent);
    assert_eq!(first.new_balance, Decimal::new(500, 0));

    let second = ledger.deposit(user_id, Decimal::new(500, 0), "k1").await.unwrap();
    assert!(second.idempotent);
    assert_eq!(second.new_balance, Decimal::new(500, 0));

    assert_eq!(ledger.get_balance(user_id).await.unwrap(), Decimal::new(500, 0));
}

#[tokio::test]
async fn debit_never_drives_balance_negative() {
    let (ledger, user_id, _repo) = new_ledger_with_wallet(Decimal::new(100, 0)).await;

    let txn_id = common::ids::TransactionId::new();
    let err = ledger
        .debit(user_id, Decimal::new(500, 0), txn_id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        wallet_service::domain::error::WalletError::InsufficientBalance(_)
    ));
    assert_eq!(ledger.get_balance(user_id).await.unwrap(), Decimal::new(100, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_debits_exceeding_balance_leave_exactly_one_winner() {
    let (ledger, user_id, _repo) = new_ledger_with_wallet(Decimal::new(100, 0)).await;
    let ledger = Arc::new(ledger);

    let txn_a = common::ids::TransactionId::new();
    let txn_b = common::ids::TransactionId::new();

    // Genuinely raced across OS threads: each debit runs on its own spawned
    // task so the multi-thread runtime can schedule them concurrently,
    // rather than `tokio::join!`'s cooperative interleaving on one task.
    let l1 = ledger.clone();
    let l2 = ledger.clone();
    let h1 = tokio::spawn(async move { l1.debit(user_id, Decimal::new(80, 0), txn_a).await });
    let h2 = tokio::spawn(async move { l2.debit(user_id, Decimal::new(80, 0), txn_b).await });
    let (r1, r2) = (h1.await.unwrap(), h2.await.unwrap());

    let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the two overlapping debits should succeed");

    let balance = ledger.get_balance(user_id).await.unwrap();
    assert_eq!(balance, Decimal::new(20, 0));
    assert!(balance >= Decimal::ZERO);
}

#[tokio::test]
async fn duplicate_debit_for_same_transaction_applies_once() {
    let (ledger, user_id, _repo) = new_ledger_with_wallet(Decimal::new(100, 0)).await;
    let txn_id = common::ids::TransactionId::new();

    let first = ledger.debit(user_id, Decimal::new(40, 0), txn_id).await.unwrap();
    let second = ledger.debit(user_id, Decimal::new(40, 0), txn_id).await.unwrap();

    assert!(!first.idempotent);
    assert!(second.idempotent);
    assert_eq!(ledger.get_balance(user_id).await.unwrap(), Decimal::new(60, 0));
}
