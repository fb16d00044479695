//! Always-succeeds test double for [`WalletLedgerGateway`], adapted from
//! the teacher's `FakeWalletGateway` mock. Useful for saga tests that care
//! about state-machine transitions rather than ledger arithmetic.

use async_trait::async_trait;
use common::ids::{TransactionId, UserId};
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::error::TransactionError;
use crate::domain::gateways::{LedgerOutcome, WalletLedgerGateway};

pub struct FakeWalletLedgerGateway;

impl FakeWalletLedgerGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeWalletLedgerGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletLedgerGateway for FakeWalletLedgerGateway {
    async fn wallet_exists(&self, _user_id: UserId) -> Result<bool, TransactionError> {
        Ok(true)
    }

    async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError> {
        info!(%user_id, %amount, %transaction_id, "fake debit approved");
        Ok(LedgerOutcome {
            new_balance: Decimal::ZERO,
            idempotent: false,
        })
    }

    async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError> {
        info!(%user_id, %amount, %transaction_id, "fake credit approved");
        Ok(LedgerOutcome {
            new_balance: Decimal::ZERO,
            idempotent: false,
        })
    }

    async fn refund(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError> {
        info!(%user_id, %amount, %transaction_id, "fake refund approved");
        Ok(LedgerOutcome {
            new_balance: Decimal::ZERO,
            idempotent: false,
        })
    }
}
