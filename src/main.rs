//! LoyaltyMax - Gamified Loyalty Rewards Core
//!
//! Runs one session check-in against the local store: records the daily
//! visit, keeps daily missions stocked, expires overdue missions and
//! re-evaluates achievements.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loyaltymax::config::load_config;
use loyaltymax::gamification::{default_catalog, MissionType, StreakType};
use loyaltymax::store::{GameStore, KeyValueStore, SqliteStore};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LoyaltyMax v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("loading configuration")?;
    tracing::info!("Using {} network, data in {}", config.network, config.data_dir.display());

    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::open(&config.database_path()).context("opening local store")?,
    );
    let mut game = GameStore::load(
        store,
        config.gamification.level_config(),
        default_catalog(),
    )
    .with_autosave(config.gamification.autosave);

    let now = Utc::now();

    let expired = game.expire_missions(now);
    if expired > 0 {
        tracing::info!("{} mission(s) expired", expired);
    }

    let visit = game.record_streak_activity(StreakType::DailyVisit, now);
    tracing::info!(
        "Daily visit streak: {} (best {}, x{:.1})",
        visit.current,
        visit.best,
        visit.multiplier
    );

    let has_daily = game
        .state()
        .missions()
        .any(|m| m.kind == MissionType::Daily && m.is_active());
    if !has_daily {
        let fresh = game.refresh_daily_missions(now);
        tracing::info!("Generated {} daily missions", fresh.len());
    }

    let metrics = game.state().derived_metrics();
    for id in game.evaluate_achievements(&metrics, now) {
        tracing::info!("Achievement unlocked: {}", id);
    }

    let level = game.user_level();
    let summary = game.state().mission_summary();
    tracing::info!(
        "{} {} - level {} ({}/{} XP), {} active / {} completed missions",
        level.badge,
        level.title,
        level.level,
        level.current_xp,
        level.next_level_xp,
        summary.active,
        summary.completed
    );

    game.save().context("saving game state")?;

    Ok(())
}
