//! Gamification layer
//!
//! Pure calculators for the loyalty program:
//! - Level curve (XP thresholds, titles, perks)
//! - Achievement progress
//! - Streak continuity and multipliers
//! - Mission generation and summaries
//! - Leaderboard snapshots

pub mod achievements;
pub mod leaderboard;
pub mod levels;
pub mod missions;
pub mod streaks;

// Re-exports for convenience
pub use achievements::{
    default_catalog, evaluate, Achievement, AchievementCategory, AchievementCheck, Condition,
    ConditionType, Rarity,
};
pub use leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardPeriod, LeaderboardType};
pub use levels::{level_benefits, LevelConfig, LevelTier, UserLevel};
pub use missions::{
    generate_daily_missions, mission_progress_summary, Difficulty, Mission, MissionRequirement,
    MissionStatus, MissionSummary, MissionType, RequirementType,
};
pub use streaks::{calculate_bonus_points, streak_multiplier, update_streak, Streak, StreakType};
