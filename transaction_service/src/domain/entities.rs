//! Transaction entity and state graph (D). Generalized from the teacher's
//! 4-state `TransactionStatus` (PENDING/COMPLETED/FAILED/REVERSED) into the
//! full graph of §4.4.

use chrono::{DateTime, Utc};
use common::ids::{TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// §4.4's legal graph. `CREDITED` is retained for external/wire
/// compatibility only — the saga never constructs it (§9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Initiated,
    Debited,
    Credited,
    Completed,
    Refunding,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

/// `{transactionId, senderId, receiverId, amount, currency, status,
/// failureReason?, initiatedAt, completedAt?}` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub failure_reason: Option<String>,
    pub description: Option<String>,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        amount: Decimal,
        currency: String,
        description: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            sender_id,
            receiver_id,
            amount,
            currency,
            status: TransactionStatus::Initiated,
            failure_reason: None,
            description,
            initiated_at: Utc::now(),
            completed_at: None,
        }
    }
}
