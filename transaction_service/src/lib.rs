//! Transaction Service Library
//!
//! Owns the Transaction State Machine (D), the Saga Orchestrator (E), the
//! Durable Job Queue (F), the Webhook Dispatcher (G), and the Notification
//! Dispatcher (H), plus the simulation admin surface (§4.5's failure
//! injection hook) and a thin HTTP surface over the in-process contracts of
//! §6.
//!
//! # Modules
//!
//! * `api` - the external-interface HTTP surface (§6); routing itself is
//!   out of scope, these handlers just expose the contracts.
//! * `domain` - transaction entity, state machine, repository and gateway
//!   ports, error taxonomy.
//! * `infrastructure` - Postgres/in-memory repository implementations and
//!   the wallet ledger gateway adapters.
//! * `jobs` - the durable job queue (F) and the stuck-transaction
//!   reconciler.
//! * `saga` - the event-driven orchestrator (E).
//! * `simulation` - the credit-path failure injection hook (§4.5, §6).
//! * `use_cases` - read-side application workflows.
//! * `webhook` - the webhook dispatcher (G): subscriptions, deliveries,
//!   HMAC signing.
//! * `notifications` - the notification dispatcher (H).

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod jobs;
pub mod notifications;
pub mod saga;
pub mod simulation;
pub mod use_cases;
pub mod webhook;
