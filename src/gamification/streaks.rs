//! Activity streaks and point multipliers.
//!
//! A streak stays alive while activity keeps arriving inside the streak
//! type's continuity window. It only grows once enough time has passed to
//! count as a new period (a new day, a new week), except for mission
//! streaks, which grow on every completion.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of activity a streak tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakType {
    DailyVisit,
    WeeklyPurchase,
    MissionComplete,
}

impl StreakType {
    pub const ALL: [StreakType; 3] = [
        StreakType::DailyVisit,
        StreakType::WeeklyPurchase,
        StreakType::MissionComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreakType::DailyVisit => "daily_visit",
            StreakType::WeeklyPurchase => "weekly_purchase",
            StreakType::MissionComplete => "mission_complete",
        }
    }

    /// Longest gap between activities that keeps the streak alive.
    pub fn continuity_window(&self) -> Duration {
        match self {
            StreakType::DailyVisit => Duration::hours(48),
            StreakType::WeeklyPurchase => Duration::hours(168),
            StreakType::MissionComplete => Duration::hours(24),
        }
    }

    /// Minimum gap before an activity counts toward a new period.
    ///
    /// `None` means every qualifying activity increments the streak.
    pub fn increment_threshold(&self) -> Option<Duration> {
        match self {
            StreakType::DailyVisit => Some(Duration::hours(20)),
            StreakType::WeeklyPurchase => Some(Duration::hours(144)),
            StreakType::MissionComplete => None,
        }
    }
}

impl std::fmt::Display for StreakType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consecutive activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    #[serde(rename = "type")]
    pub kind: StreakType,
    pub current: u32,
    pub best: u32,
    pub last_activity: DateTime<Utc>,
    pub multiplier: f64,
}

impl Streak {
    /// Fresh streak with no activity counted yet.
    pub fn new(kind: StreakType, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            current: 0,
            best: 0,
            last_activity: now,
            multiplier: 1.0,
        }
    }

    /// Whether an activity at `at` would continue this streak.
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        elapsed_since(self.last_activity, at) <= self.kind.continuity_window()
    }

    /// Advance the streak for an activity at `at`, returning the new record.
    pub fn advanced(&self, at: DateTime<Utc>) -> Streak {
        update_streak(self, at)
    }
}

/// Time between two instants, treating clock skew as no time at all.
fn elapsed_since(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).max(Duration::zero())
}

/// Point multiplier for a streak length.
pub fn streak_multiplier(current: u32) -> f64 {
    match current {
        30.. => 3.0,
        14.. => 2.5,
        7.. => 2.0,
        3.. => 1.5,
        _ => 1.0,
    }
}

/// Apply an activity at `at` to a streak.
pub fn update_streak(streak: &Streak, at: DateTime<Utc>) -> Streak {
    let current = if !streak.is_active(at) {
        1
    } else if streak.current == 0 {
        // First counted activity opens the streak.
        1
    } else {
        let elapsed = elapsed_since(streak.last_activity, at);
        match streak.kind.increment_threshold() {
            Some(threshold) if elapsed < threshold => streak.current,
            _ => streak.current + 1,
        }
    };

    Streak {
        kind: streak.kind,
        current,
        best: streak.best.max(current),
        last_activity: at,
        multiplier: streak_multiplier(current),
    }
}

/// Points after applying active streak multipliers and the level bonus
/// (5% per level).
pub fn calculate_bonus_points(
    base_points: u64,
    level: u32,
    streaks: &[Streak],
    now: DateTime<Utc>,
) -> u64 {
    let streak_factor: f64 = streaks
        .iter()
        .filter(|s| s.is_active(now))
        .map(|s| s.multiplier)
        .product();
    let level_factor = 1.0 + level as f64 * 0.05;

    (base_points as f64 * streak_factor * level_factor).floor() as u64
}
