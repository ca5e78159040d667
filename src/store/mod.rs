//! State ownership and persistence.

pub mod game;
pub mod persistence;

pub use game::{GameError, GameState, GameStore, MissionOutcome, XpAward};
pub use persistence::{
    load_json, save_json, KeyValueStore, MemoryStore, PersistenceError, SqliteStore,
    GAME_STATE_KEY, WALLET_STATE_KEY,
};
