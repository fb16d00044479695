pub mod fake_wallet_gateway;
pub mod in_process_wallet_gateway;
