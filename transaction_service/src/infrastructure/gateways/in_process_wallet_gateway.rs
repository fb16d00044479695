//! Replaces the teacher's networked `WalletGateway` (gRPC client /
//! `FakeWalletGateway` stub) with a direct, in-process call into
//! `wallet_service::ledger::WalletLedger`. HTTP/gRPC routing between the two
//! services is an out-of-scope external collaborator (§1); the saga only
//! needs the four ledger operations, which this adapter forwards
//! one-to-one.

use std::sync::Arc;

use async_trait::async_trait;
use common::ids::{TransactionId, UserId};
use rust_decimal::Decimal;
use wallet_service::domain::error::WalletError;
use wallet_service::ledger::WalletLedger;

use crate::domain::error::TransactionError;
use crate::domain::gateways::{LedgerOutcome, WalletLedgerGateway};

pub struct InProcessWalletLedgerGateway {
    ledger: Arc<WalletLedger>,
}

impl InProcessWalletLedgerGateway {
    pub fn new(ledger: Arc<WalletLedger>) -> Self {
        Self { ledger }
    }
}

/// Maps a `WalletError` onto the transaction-side taxonomy for a call made
/// on behalf of `transaction_id`. `PreconditionFailed` must carry that real
/// transaction id forward rather than a fabricated one, so a caller
/// matching on `TransactionError::PreconditionFailed(id)` sees the
/// transaction it was actually operating on.
fn map_err(transaction_id: TransactionId, err: WalletError) -> TransactionError {
    match err {
        WalletError::UserNotFound(id) => TransactionError::SenderWalletNotFound(id),
        WalletError::NotFound(_) => TransactionError::RepositoryError("wallet not found".into()),
        WalletError::InsufficientBalance(_) => {
            TransactionError::InvalidArg("insufficient balance".into())
        }
        WalletError::PreconditionFailed(_) => TransactionError::PreconditionFailed(transaction_id),
        WalletError::InvalidData(e) => TransactionError::InvalidArg(e),
        WalletError::RepositoryError(e) => TransactionError::Transient(e),
    }
}

#[async_trait]
impl WalletLedgerGateway for InProcessWalletLedgerGateway {
    /// No transaction exists yet at this call site (it runs during
    /// `initiateTransaction`'s validation, before a transaction is
    /// created), so there is no real transaction id to attach to a
    /// `PreconditionFailed`; that variant cannot arise from a plain balance
    /// read in practice, but it is mapped to `Transient` rather than
    /// through `map_err` to avoid fabricating one.
    async fn wallet_exists(&self, user_id: UserId) -> Result<bool, TransactionError> {
        match self.ledger.get_balance(user_id).await {
            Ok(_) => Ok(true),
            Err(WalletError::UserNotFound(_)) => Ok(false),
            Err(WalletError::PreconditionFailed(wallet_id)) => Err(TransactionError::Transient(
                format!("precondition failed on wallet {wallet_id}"),
            )),
            Err(e) => Err(map_err(TransactionId::new(), e)),
        }
    }

    async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError> {
        let result = self
            .ledger
            .debit(user_id, amount, transaction_id)
            .await
            .map_err(|e| map_err(transaction_id, e))?;
        Ok(LedgerOutcome {
            new_balance: result.new_balance,
            idempotent: result.idempotent,
        })
    }

    async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError> {
        let result = self
            .ledger
            .credit(user_id, amount, transaction_id)
            .await
            .map_err(|e| map_err(transaction_id, e))?;
        Ok(LedgerOutcome {
            new_balance: result.new_balance,
            idempotent: result.idempotent,
        })
    }

    async fn refund(
        &self,
        user_id: UserId,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerOutcome, TransactionError> {
        let result = self
            .ledger
            .refund(user_id, amount, transaction_id)
            .await
            .map_err(|e| map_err(transaction_id, e))?;
        Ok(LedgerOutcome {
            new_balance: result.new_balance,
            idempotent: result.idempotent,
        })
    }
}
