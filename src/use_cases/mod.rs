pub mod get_transaction_details;
pub mod get_wallet;
pub mod get_wallet_history;
pub mod list_asset_types;
pub mod list_wallets;
pub mod process_transaction;
