use chrono::{DateTime, Utc};
use common::ids::{TransactionId, UserId};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::domain::entities::{Transaction, TransactionStatus};

#[derive(Debug, FromRow)]
pub struct TransactionModel {
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

impl From<&Transaction> for TransactionModel {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id,
            sender_id: t.sender_id,
            receiver_id: t.receiver_id,
            amount: t.amount,
            currency: t.currency.clone(),
            status: t.status,
            failure_reason: t.failure_reason.clone(),
            description: t.description.clone(),
            initiated_at: t.initiated_at,
            completed_at: t.completed_at,
        }
    }
}

impl From<TransactionModel> for Transaction {
    fn from(m: TransactionModel) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            receiver_id: m.receiver_id,
            amount: m.amount,
            currency: m.currency,
            status: m.status,
            failure_reason: m.failure_reason,
            description: m.description,
            initiated_at: m.initiated_at,
            completed_at: m.completed_at,
        }
    }
}
