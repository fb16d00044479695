//! Publish/subscribe event bus (component A) and the domain event envelope
//! that flows across it.
//!
//! Grounded on `other_examples/.../consumer_tasks.rs`'s
//! `EventBus::subscribe(subject) -> Stream` + at-least-once delivery shape,
//! adapted to an in-process handler-registry form because §4.1 requires
//! at-most-one handler per event type per process (a newer `subscribe`
//! supersedes the previous one) rather than a fan-out stream.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::ids::TransactionId;

/// Wire-form event type identifiers (§6). Also a Postgres enum
/// (`event_type`) so the webhook delivery log can store `event_type` as a
/// native column rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    TransactionInitiated,
    TransactionCompleted,
    TransactionFailed,
    DebitSuccess,
    DebitFailed,
    CreditSuccess,
    CreditFailed,
    RefundRequested,
    RefundCompleted,
    RefundFailed,
}

impl EventType {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            EventType::TransactionInitiated => "TRANSACTION_INITIATED",
            EventType::TransactionCompleted => "TRANSACTION_COMPLETED",
            EventType::TransactionFailed => "TRANSACTION_FAILED",
            EventType::DebitSuccess => "DEBIT_SUCCESS",
            EventType::DebitFailed => "DEBIT_FAILED",
            EventType::CreditSuccess => "CREDIT_SUCCESS",
            EventType::CreditFailed => "CREDIT_FAILED",
            EventType::RefundRequested => "REFUND_REQUESTED",
            EventType::RefundCompleted => "REFUND_COMPLETED",
            EventType::RefundFailed => "REFUND_FAILED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire_str())
    }
}

/// Wallet operation kind (§3); also used to derive a deterministic
/// `OperationId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Debit,
    Credit,
    Refund,
    Deposit,
}

/// In-flight-only event envelope (§3). Never persisted; the transaction and
/// operation records are the durable source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_type: EventType,
    pub transaction_id: TransactionId,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl DomainEvent {
    pub fn new(event_type: EventType, transaction_id: TransactionId, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            transaction_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("event bus is not connected")]
    NotConnected,
    #[error("event bus reconnect failed after {attempts} attempts")]
    Fatal { attempts: u32 },
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Handler = Arc<dyn Fn(DomainEvent) -> HandlerFuture + Send + Sync>;

/// Composes several handlers that all want the same `EventType` into one.
///
/// [`InMemoryEventBus::subscribe`] keeps at most one handler per event type
/// (§4.1: "a newer subscribe supersedes the previous one"), but more than one
/// component legitimately reacts to the same event (e.g. both the webhook
/// dispatcher and the notification dispatcher react to `CREDIT_SUCCESS`).
/// Callers with overlapping interests should combine their handlers with
/// `fanout` and subscribe the result once, instead of subscribing
/// independently and silently clobbering each other.
pub fn fanout(handlers: Vec<Handler>) -> Handler {
    Arc::new(move |event: DomainEvent| {
        let handlers = handlers.clone();
        Box::pin(async move {
            for h in handlers {
                h(event.clone()).await;
            }
        }) as HandlerFuture
    })
}

/// Publish/subscribe abstraction (§4.1). Production deployments back this
/// with a cluster-wide broker; tests and the saga's own wiring use
/// [`InMemoryEventBus`] directly, per the Design Notes (§9) guidance to keep
/// a broker-backed implementation and a direct in-process dispatcher behind
/// one interface.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn connect(&self) -> Result<(), EventBusError>;
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
    async fn subscribe(&self, event_type: EventType, handler: Handler) -> Result<(), EventBusError>;
    async fn unsubscribe(&self, event_type: EventType);
}

/// In-process event bus. Delivery to handlers is best-effort and
/// at-least-once within a connected session (§4.1); it preserves publish
/// order within a single publisher because `publish` awaits the handler to
/// completion before returning. There is no durability: if no handler is
/// registered at publish time, the event is dropped.
pub struct InMemoryEventBus {
    connected: AtomicBool,
    reconnect_attempts: AtomicU32,
    handlers: Mutex<HashMap<EventType, Handler>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            reconnect_attempts: AtomicU32::new(0),
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Reconnects with exponential backoff: `delay = min(100 * attempt, 3000)ms`,
    /// giving up after 3 attempts (§4.1).
    pub async fn reconnect(&self) -> Result<(), EventBusError> {
        for attempt in 1..=3u32 {
            let delay_ms = std::cmp::min(100 * attempt, 3000);
            tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
            if self.connect().await.is_ok() {
                self.reconnect_attempts.store(0, Ordering::SeqCst);
                return Ok(());
            }
            warn!(attempt, "event bus reconnect attempt failed");
        }
        error!("event bus reconnect exhausted all attempts");
        Err(EventBusError::Fatal { attempts: 3 })
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn connect(&self) -> Result<(), EventBusError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(EventBusError::NotConnected);
        }
        let handler = {
            let handlers = self.handlers.lock().await;
            handlers.get(&event.event_type).cloned()
        };
        if let Some(handler) = handler {
            handler(event).await;
        }
        Ok(())
    }

    async fn subscribe(&self, event_type: EventType, handler: Handler) -> Result<(), EventBusError> {
        // A newer subscription supersedes any existing one for this event
        // type, per §4.1.
        let mut handlers = self.handlers.lock().await;
        handlers.insert(event_type, handler);
        Ok(())
    }

    async fn unsubscribe(&self, event_type: EventType) {
        let mut handlers = self.handlers.lock().await;
        handlers.remove(&event_type);
    }
}
