pub mod entities;
pub mod error;
pub mod gateways;
pub mod repository;
pub mod state_machine;
