//! Ledger Store (B) + Wallet Ledger (C). Owns users, wallets, wallet
//! operations, and the atomic debit/credit/refund/deposit algorithm that
//! `transaction_service`'s saga drives through the in-process gateway.

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod ledger;
