//! Generalizes the teacher's single `WalletGateway::process_movement` into
//! the four ledger operations the saga calls directly (§4.5): debit,
//! credit, refund, and a balance/existence check used by
//! `initiateTransaction`'s validation step.

use async_trait::async_trait;
use common::ids::{TransactionId, UserId};
use rust_decimal::Decimal;

use crate::domain::error::TransactionError;

#[derive(Debug, Clone, Copy)]
pub struct LedgerOutcome {
    pub new_balance: Decimal,
    pub idempotent: bool,
}

/// The saga's view of the Wallet Ledger (C). Implemented in-process against
/// `wallet_service::ledger::WalletLedger` — the generalized, non-networked
/// replacement for the teacher's gRPC `WalletGateway`, since HTTP/gRPC
/// routing between the two services is out of scope (§1) and the teacher's
/// own gRPC service was an unimplemented stub.
#[async_trait]
pub trait WalletLedgerGateway: Send + Sync {
    async fn wallet_exists(&self, user_id: UserId) -> Result<bool, TransactionError>;

    async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError>;

    async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError>;

    async fn refund(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError>;
}
