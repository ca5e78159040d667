//! LoyaltyMax - Gamified Loyalty Rewards Core
//!
//! Client-side core of a loyalty program: XP levels, achievements, streaks and
//! missions, a persisted game state store, wallet and token facades over an
//! external ledger, and merchant QR payloads.

pub mod config;
pub mod gamification;
pub mod ledger;
pub mod merchant;
pub mod store;
pub mod wallet;

// Re-export commonly used types
pub use config::AppConfig;
pub use gamification::{Achievement, LevelConfig, Mission, Streak, StreakType, UserLevel};
pub use ledger::{LedgerClient, TokenOperations};
pub use merchant::QrPayload;
pub use store::{GameState, GameStore, KeyValueStore, SqliteStore};
pub use wallet::{WalletProvider, WalletSession};
