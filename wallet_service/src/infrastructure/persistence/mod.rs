pub mod in_memory;
pub mod models;
pub mod user_repository;
pub mod wallet_repository;
