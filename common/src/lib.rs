//! Shared kernel for the money-movement transactional engine.
//!
//! Both `wallet_service` and `transaction_service` depend on this crate so
//! that a domain event published by one is the same wire type consumed by
//! the other.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod telemetry;
