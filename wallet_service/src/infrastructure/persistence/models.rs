//! SQLx row models for the `users`/`wallets`/`wallet_operations` tables.
//! Kept separate from the domain entities so a schema column (e.g.
//! `created_at`) never leaks into domain logic that doesn't need it.

use chrono::{DateTime, Utc};
use common::events::OperationKind;
use common::ids::{OperationId, TransactionId, UserId, WalletId};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::domain::entities::{User, Wallet, WalletOperation};
use crate::domain::error::{UserError, WalletError};

#[derive(Debug, FromRow)]
pub struct UserModel {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserModel {
    fn from(u: User) -> Self {
        Self {
            id: u.id(),
            name: u.name().to_string(),
            email: u.email().to_string(),
            created_at: u.created_at(),
        }
    }
}

impl TryFrom<UserModel> for User {
    type Error = UserError;

    fn try_from(m: UserModel) -> Result<Self, Self::Error> {
        User::reconstitute(m.id, m.name, m.email, m.created_at)
    }
}

#[derive(Debug, FromRow)]
pub struct WalletModel {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance: Decimal,
    pub currency: String,
    pub is_active: bool,
}

impl From<Wallet> for WalletModel {
    fn from(w: Wallet) -> Self {
        Self {
            id: w.id(),
            user_id: w.user_id(),
            balance: w.balance(),
            currency: w.currency().to_string(),
            is_active: w.is_active(),
        }
    }
}

impl TryFrom<WalletModel> for Wallet {
    type Error = WalletError;

    fn try_from(m: WalletModel) -> Result<Self, Self::Error> {
        Wallet::reconstitute(m.id, m.user_id, m.balance, m.currency, m.is_active)
    }
}

/// `kind` is stored as text (`DEBIT`/`CREDIT`/`REFUND`/`DEPOSIT`); sqlx has no
/// direct `OperationKind` mapping so the conversion is explicit here rather
/// than via a derive.
#[derive(Debug, FromRow)]
pub struct WalletOperationModel {
    pub operation_id: OperationId,
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub kind: String,
    pub amount: Decimal,
    pub result_balance: Decimal,
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
}

impl From<WalletOperation> for WalletOperationModel {
    fn from(op: WalletOperation) -> Self {
        Self {
            operation_id: op.operation_id,
            wallet_id: op.wallet_id,
            user_id: op.user_id,
            kind: kind_to_str(op.kind).to_string(),
            amount: op.amount,
            result_balance: op.result_balance,
            transaction_id: op.transaction_id,
            created_at: op.created_at,
        }
    }
}

impl TryFrom<WalletOperationModel> for WalletOperation {
    type Error = WalletError;

    fn try_from(m: WalletOperationModel) -> Result<Self, Self::Error> {
        Ok(WalletOperation {
            operation_id: m.operation_id,
            wallet_id: m.wallet_id,
            user_id: m.user_id,
            kind: kind_from_str(&m.kind)?,
            amount: m.amount,
            result_balance: m.result_balance,
            transaction_id: m.transaction_id,
            created_at: m.created_at,
        })
    }
}

pub fn kind_to_str(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Debit => "DEBIT",
        OperationKind::Credit => "CREDIT",
        OperationKind::Refund => "REFUND",
        OperationKind::Deposit => "DEPOSIT",
    }
}

pub fn kind_from_str(s: &str) -> Result<OperationKind, WalletError> {
    match s {
        "DEBIT" => Ok(OperationKind::Debit),
        "CREDIT" => Ok(OperationKind::Credit),
        "REFUND" => Ok(OperationKind::Refund),
        "DEPOSIT" => Ok(OperationKind::Deposit),
        other => Err(WalletError::InvalidData(format!("unknown operation kind: {other}"))),
    }
}
