//! Entity models for the Ledger Store (B) and Wallet Ledger (C). Grounded on
//! `wallet_service/src/domain/entities.rs`'s builder pattern, extended with
//! the `WalletOperation` audit/idempotency row from spec §3.

use chrono::{DateTime, Utc};
use common::events::OperationKind;
use common::ids::{OperationId, TransactionId, UserId, WalletId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::{UserError, WalletError};

/// `{userId, name, email}`. Email uniqueness is enforced by the repository's
/// unique index. Immutable after creation by this core (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String) -> Result<Self, UserError> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(UserError::InvalidData(
                "name and email cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: UserId::new(),
            name,
            email,
            created_at: Utc::now(),
        })
    }

    pub fn reconstitute(
        id: UserId,
        name: String,
        email: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(UserError::InvalidData(
                "name and email cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            email,
            created_at,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// `{walletId, userId, balance, currency, isActive}`. Exactly one wallet per
/// `(userId, currency)` (enforced by the repository's compound unique
/// index). Invariant: `balance >= 0` at all times, enforced by the
/// repository's conditional update (§4.3), never by client-side checks
/// alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    user_id: UserId,
    balance: Decimal,
    currency: String,
    is_active: bool,
}

impl Wallet {
    pub fn builder() -> WalletBuilder {
        WalletBuilder::default()
    }

    pub fn reconstitute(
        id: WalletId,
        user_id: UserId,
        balance: Decimal,
        currency: String,
        is_active: bool,
    ) -> Result<Self, WalletError> {
        let currency = normalize_currency(&currency)?;
        Ok(Self {
            id,
            user_id,
            balance,
            currency,
            is_active,
        })
    }

    pub fn id(&self) -> WalletId {
        self.id
    }
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
    pub fn balance(&self) -> Decimal {
        self.balance
    }
    pub fn currency(&self) -> &str {
        &self.currency
    }
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Applies a balance delta in-memory. Only ever used by in-memory
    /// repository implementations that hold the wallet behind a lock; the
    /// Postgres implementation performs this as a single conditional
    /// `UPDATE` instead (§4.2) and never mutates a loaded `Wallet` value.
    pub(crate) fn with_balance(&self, new_balance: Decimal) -> Self {
        Self {
            balance: new_balance,
            ..self.clone()
        }
    }
}

fn normalize_currency(currency: &str) -> Result<String, WalletError> {
    let currency = currency.trim().to_uppercase();
    if currency.len() != 3 {
        return Err(WalletError::InvalidData(
            "currency must be a 3-letter ISO code".into(),
        ));
    }
    Ok(currency)
}

#[derive(Default)]
pub struct WalletBuilder {
    user_id: Option<UserId>,
    currency: Option<String>,
}

impl WalletBuilder {
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn currency(mut self, currency: String) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn build(self) -> Result<Wallet, WalletError> {
        let user_id = self
            .user_id
            .ok_or_else(|| WalletError::InvalidData("user_id is required".into()))?;
        let currency = self
            .currency
            .ok_or_else(|| WalletError::InvalidData("currency is required".into()))?;
        let currency = normalize_currency(&currency)?;

        Ok(Wallet {
            id: WalletId::new(),
            user_id,
            balance: Decimal::ZERO,
            currency,
            is_active: true,
        })
    }
}

/// Audit + idempotency row (§3). At most one row exists for any
/// `(transaction_id, kind)`, enforced by the repository's unique index on
/// `operation_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletOperation {
    pub operation_id: OperationId,
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub kind: OperationKind,
    pub amount: Decimal,
    pub result_balance: Decimal,
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
}
