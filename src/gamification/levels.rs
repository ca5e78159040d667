//! XP and level curve.
//!
//! Level thresholds follow a geometric progression: reaching level `n + 1`
//! from level `n` costs `floor(base_xp * multiplier^(n - 1))` XP.

use serde::{Deserialize, Serialize};

/// Display tier for a level band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTier {
    /// First level this tier applies to
    pub level: u32,
    /// Display title
    pub title: String,
    /// Badge glyph
    pub badge: String,
}

impl LevelTier {
    fn new(level: u32, title: &str, badge: &str) -> Self {
        Self {
            level,
            title: title.to_string(),
            badge: badge.to_string(),
        }
    }
}

/// Level curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Highest reachable level
    pub max_level: u32,
    /// XP needed to go from level 1 to level 2
    pub base_xp: u64,
    /// Growth factor between consecutive level costs
    pub xp_multiplier: f64,
    /// Titles and badges, sorted by level
    pub tiers: Vec<LevelTier>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            max_level: 50,
            base_xp: 100,
            xp_multiplier: 1.5,
            tiers: vec![
                LevelTier::new(1, "Newcomer", "🌟"),
                LevelTier::new(2, "Explorer", "🚀"),
                LevelTier::new(3, "Adventurer", "⚡"),
                LevelTier::new(4, "Champion", "👑"),
                LevelTier::new(5, "Legend", "💎"),
            ],
        }
    }
}

/// A user's position on the level curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLevel {
    pub level: u32,
    /// XP earned since reaching the current level
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    /// XP the current level costs in total (0 at max level)
    #[serde(rename = "nextLevelXP")]
    pub next_level_xp: u64,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub title: String,
    pub badge: String,
    pub benefits: Vec<String>,
}

impl UserLevel {
    /// Progress through the current level as a percentage (0..100).
    pub fn progress_percent(&self) -> f32 {
        if self.next_level_xp == 0 {
            return 100.0;
        }
        ((self.current_xp as f64 / self.next_level_xp as f64) * 100.0).min(100.0) as f32
    }

    /// XP still missing before the next level.
    pub fn xp_to_next_level(&self) -> u64 {
        self.next_level_xp.saturating_sub(self.current_xp)
    }

    /// Whether the level cap has been reached.
    pub fn is_max_level(&self) -> bool {
        self.next_level_xp == 0
    }
}

impl LevelConfig {
    /// XP needed to advance from `level` to `level + 1`.
    pub fn xp_for_next_level(&self, level: u32) -> u64 {
        if level >= self.max_level {
            return 0;
        }
        let exponent = level.saturating_sub(1) as i32;
        (self.base_xp as f64 * self.xp_multiplier.powi(exponent)).floor() as u64
    }

    /// Cumulative XP needed to reach `level`.
    pub fn total_xp_for_level(&self, level: u32) -> u64 {
        (1..level.min(self.max_level)).fold(0u64, |total, l| {
            total.saturating_add(self.xp_for_next_level(l))
        })
    }

    /// Map accumulated XP onto the level curve.
    pub fn calculate_level(&self, total_xp: u64) -> UserLevel {
        let mut level = 1;
        let mut threshold = 0u64;

        while level < self.max_level {
            let next = threshold.saturating_add(self.xp_for_next_level(level));
            if total_xp < next {
                break;
            }
            threshold = next;
            level += 1;
        }

        let tier = self.tier_for(level);

        UserLevel {
            level,
            current_xp: total_xp - threshold,
            next_level_xp: self.xp_for_next_level(level),
            total_xp,
            title: tier.map(|t| t.title.clone()).unwrap_or_default(),
            badge: tier.map(|t| t.badge.clone()).unwrap_or_default(),
            benefits: level_benefits(level),
        }
    }

    /// Highest tier whose starting level is at or below `level`.
    fn tier_for(&self, level: u32) -> Option<&LevelTier> {
        self.tiers
            .iter()
            .filter(|t| t.level <= level)
            .max_by_key(|t| t.level)
            .or_else(|| self.tiers.first())
    }
}

/// Perks unlocked at a given level (cumulative).
pub fn level_benefits(level: u32) -> Vec<String> {
    const PERKS: &[(u32, &str)] = &[
        (2, "Access to exclusive rewards"),
        (3, "2x points on weekends"),
        (4, "VIP customer support"),
        (5, "Early access to new features"),
        (10, "Special anniversary rewards"),
        (15, "Free shipping on all orders"),
        (20, "Personal loyalty manager"),
        (25, "Invitation to exclusive events"),
    ];

    PERKS
        .iter()
        .filter(|(min, _)| level >= *min)
        .map(|(_, perk)| perk.to_string())
        .collect()
}
