//! Leaderboard snapshots.
//!
//! Leaderboards are computed elsewhere and handed to the game store as
//! read-only snapshots; this module only ranks and queries them.

use serde::{Deserialize, Serialize};

/// What a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardType {
    Points,
    Level,
    Achievements,
    Streak,
}

/// Time period covered by a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    Monthly,
    #[default]
    AllTime,
}

/// Leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub score: u64,
    pub rank: u32,
    /// Rank change from the previous period (positive = climbed)
    #[serde(default)]
    pub change: i32,
}

/// Ranked list of users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LeaderboardType,
    pub period: LeaderboardPeriod,
    pub entries: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub user_rank: Option<u32>,
    pub total_participants: u32,
}

impl Leaderboard {
    pub fn new(id: &str, name: &str, kind: LeaderboardType, period: LeaderboardPeriod) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            period,
            entries: Vec::new(),
            user_rank: None,
            total_participants: 0,
        }
    }

    /// Sort entries by score (descending) and assign 1-based ranks.
    ///
    /// Equal scores share a rank.
    pub fn rank_entries(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));

        let mut previous: Option<(u64, u32)> = None;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let rank = match previous {
                Some((score, rank)) if score == entry.score => rank,
                _ => index as u32 + 1,
            };
            entry.rank = rank;
            previous = Some((entry.score, rank));
        }

        self.total_participants = self.total_participants.max(self.entries.len() as u32);
    }

    /// Top `n` entries.
    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Entry for a given user, if ranked.
    pub fn entry_for(&self, user_id: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    /// Record the viewing user's rank from the entries.
    pub fn locate_user(&mut self, user_id: &str) -> Option<u32> {
        self.user_rank = self.entry_for(user_id).map(|e| e.rank);
        self.user_rank
    }
}
