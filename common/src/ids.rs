//! Newtype identifiers, following `wallet_service::domain::types`'s
//! newtype-over-`Uuid` pattern.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(WalletId);
uuid_id!(WebhookId);
uuid_id!(DeliveryId);
uuid_id!(NotificationId);

/// Server-generated opaque transaction token: `txn_` prefix + 128-bit UUID,
/// per spec §3. Unlike the other IDs this one carries a stable string
/// representation because it is handed back to external callers as an
/// opaque token, not merely logged internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn_{}", self.0.simple())
    }
}

/// Deterministic idempotency/audit key for a `WalletOperation` row (§3):
/// `"{transactionId}:{kind}"` for saga steps, `"deposit:{clientKey}"` for
/// idempotent deposits. Deliberately a plain string, not a `Uuid` — it is
/// derived, not generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct OperationId(pub String);

impl OperationId {
    pub fn for_transaction(transaction_id: TransactionId, kind: crate::events::OperationKind) -> Self {
        Self(format!("{}:{:?}", transaction_id, kind))
    }

    pub fn for_deposit(client_key: &str) -> Self {
        Self(format!("deposit:{}", client_key))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-supplied job identifier; deduplicates queue submissions (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
