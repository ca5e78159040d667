//! Achievement catalog and progress evaluation.

pub mod definitions;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use definitions::default_catalog;

/// Achievement rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Draw weights for random rarity rolls (percent).
    const WEIGHTS: [(Rarity, u32); 4] = [
        (Rarity::Common, 60),
        (Rarity::Rare, 25),
        (Rarity::Epic, 12),
        (Rarity::Legendary, 3),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    /// Chance of this rarity in a random roll, in percent.
    pub fn chance(&self) -> u32 {
        Self::WEIGHTS
            .iter()
            .find(|(rarity, _)| rarity == self)
            .map(|(_, weight)| *weight)
            .unwrap_or(0)
    }

    /// Pick a rarity at random using the standard drop weights.
    pub fn roll() -> Self {
        Self::from_roll(fastrand::u32(0..100))
    }

    /// Resolve a roll in `0..100` against the cumulative weights.
    pub fn from_roll(roll: u32) -> Self {
        let mut cumulative = 0;
        for (rarity, weight) in Self::WEIGHTS {
            cumulative += weight;
            if roll < cumulative {
                return rarity;
            }
        }
        Rarity::Common
    }
}

/// Achievement grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Purchase,
    Streak,
    Social,
    Exploration,
    Milestone,
}

/// How an achievement's target is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    /// Number of occurrences
    Count,
    /// Length of a streak
    Streak,
    /// Accumulated amount (points, currency)
    Amount,
    /// Wall-clock date; target is Unix milliseconds
    Date,
}

/// Unlock condition for an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub target: f64,
    /// Name of the user metric compared against `target`
    pub metric: String,
}

impl Condition {
    pub fn new(kind: ConditionType, target: f64, metric: &str) -> Self {
        Self {
            kind,
            target,
            metric: metric.to_string(),
        }
    }
}

/// Achievement definition plus the user's standing on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub rarity: Rarity,
    pub category: AchievementCategory,
    /// Loyalty points awarded on unlock
    pub points: u64,
    /// XP awarded on unlock
    pub xp: u64,
    pub condition: Condition,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Progress percentage (0..=100)
    #[serde(default)]
    pub progress: u8,
}

impl Achievement {
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        rarity: Rarity,
        category: AchievementCategory,
        condition: Condition,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: format!("achievement_{}", id),
            rarity,
            category,
            points: 0,
            xp: 0,
            condition,
            unlocked: false,
            unlocked_at: None,
            progress: 0,
        }
    }

    /// Set point and XP rewards
    pub fn with_rewards(mut self, points: u64, xp: u64) -> Self {
        self.points = points;
        self.xp = xp;
        self
    }

    /// Evaluate this achievement's condition against the given metrics.
    pub fn check(&self, metrics: &HashMap<String, f64>, now: DateTime<Utc>) -> AchievementCheck {
        evaluate(&self.condition, metrics, now)
    }
}

/// Result of evaluating an achievement condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementCheck {
    pub unlocked: bool,
    /// Progress percentage (0..=100)
    pub progress: u8,
}

/// Compare a metric snapshot against a condition.
///
/// Metrics missing from the map count as zero. Granting rewards exactly once
/// is the caller's job.
pub fn evaluate(
    condition: &Condition,
    metrics: &HashMap<String, f64>,
    now: DateTime<Utc>,
) -> AchievementCheck {
    let value = metrics.get(&condition.metric).copied().unwrap_or(0.0);

    match condition.kind {
        ConditionType::Count | ConditionType::Amount | ConditionType::Streak => {
            let unlocked = value >= condition.target;
            let progress = if unlocked || condition.target <= 0.0 {
                100.0
            } else {
                ((value / condition.target) * 100.0).round().clamp(0.0, 100.0)
            };
            AchievementCheck {
                unlocked,
                progress: progress as u8,
            }
        }
        ConditionType::Date => {
            let unlocked = now.timestamp_millis() as f64 >= condition.target;
            AchievementCheck {
                unlocked,
                progress: if unlocked { 100 } else { 0 },
            }
        }
    }
}
