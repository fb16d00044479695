pub mod in_memory;
pub mod models;
pub mod transaction_repository;
