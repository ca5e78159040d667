//! Integration test modules.

mod game_store_test;
mod ledger_mock;
mod wallet_test;
