//! Time-boxed missions and the daily mission generator.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mission cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    Daily,
    Weekly,
    Monthly,
    Special,
}

impl MissionType {
    /// Standard lifetime of a mission of this type. Special missions set
    /// their own expiry.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            MissionType::Daily => Some(Duration::hours(24)),
            MissionType::Weekly => Some(Duration::days(7)),
            MissionType::Monthly => Some(Duration::days(30)),
            MissionType::Special => None,
        }
    }
}

/// Mission difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Reward multiplier for the difficulty.
    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
        }
    }
}

/// Mission lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Active,
    Completed,
    Expired,
    Locked,
}

impl MissionStatus {
    /// Completed and expired missions never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Expired)
    }
}

/// What a requirement measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    PurchaseAmount,
    VisitCount,
    Referral,
    SocialShare,
    Review,
}

/// A single measurable step of a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRequirement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RequirementType,
    pub target: f64,
    pub current: f64,
    pub description: String,
}

impl MissionRequirement {
    pub fn new(id: &str, kind: RequirementType, target: f64, description: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            target,
            current: 0.0,
            description: description.to_string(),
        }
    }

    /// Fraction of the target reached (0.0..=1.0).
    pub fn fraction(&self) -> f64 {
        if self.target <= 0.0 {
            return 1.0;
        }
        (self.current / self.target).clamp(0.0, 1.0)
    }

    pub fn is_met(&self) -> bool {
        self.current >= self.target
    }
}

/// Time-boxed task with a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: MissionType,
    pub difficulty: Difficulty,
    pub point_reward: u64,
    pub xp_reward: u64,
    pub expires_at: DateTime<Utc>,
    pub requirements: Vec<MissionRequirement>,
    pub status: MissionStatus,
    /// Progress percentage (0..=100)
    pub progress: u8,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Mission {
    /// Whether the mission has run out of time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.status == MissionStatus::Active
    }

    /// Progress derived from requirement completion (mean of requirement
    /// fractions), as a percentage rounded down.
    pub fn requirement_progress(&self) -> u8 {
        if self.requirements.is_empty() {
            return self.progress;
        }
        let mean = self
            .requirements
            .iter()
            .map(MissionRequirement::fraction)
            .sum::<f64>()
            / self.requirements.len() as f64;
        (mean * 100.0).floor() as u8
    }

    /// Whether every requirement has reached its target.
    pub fn requirements_met(&self) -> bool {
        self.requirements.iter().all(MissionRequirement::is_met)
    }

    /// Time left before expiry, zero once expired.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Template a generated mission is built from.
struct MissionTemplate {
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    difficulty: Difficulty,
    point_reward: u64,
    xp_reward: u64,
    requirement: (&'static str, RequirementType, f64, &'static str),
}

const DAILY_TEMPLATES: &[MissionTemplate] = &[
    MissionTemplate {
        title: "Daily Check-in",
        description: "Visit the app and claim your daily bonus",
        icon: "📅",
        difficulty: Difficulty::Easy,
        point_reward: 10,
        xp_reward: 5,
        requirement: ("checkin", RequirementType::VisitCount, 1.0, "Check in today"),
    },
    MissionTemplate {
        title: "Spend & Earn",
        description: "Make a purchase to earn bonus points",
        icon: "💰",
        difficulty: Difficulty::Medium,
        point_reward: 50,
        xp_reward: 25,
        requirement: (
            "purchase",
            RequirementType::PurchaseAmount,
            20.0,
            "Spend $20 or more",
        ),
    },
    MissionTemplate {
        title: "Social Sharer",
        description: "Share your achievement on social media",
        icon: "📱",
        difficulty: Difficulty::Easy,
        point_reward: 25,
        xp_reward: 10,
        requirement: (
            "share",
            RequirementType::SocialShare,
            1.0,
            "Share on social media",
        ),
    },
];

/// Scale a base reward by user level: `floor(base * (1 + level * 0.1))`.
pub fn scale_reward(base: u64, level: u32) -> u64 {
    (base as f64 * (1.0 + level as f64 * 0.1)).floor() as u64
}

/// Build the daily mission set for a user at `level`.
pub fn generate_daily_missions(level: u32, now: DateTime<Utc>) -> Vec<Mission> {
    let expires_at = now
        + MissionType::Daily
            .duration()
            .unwrap_or_else(|| Duration::hours(24));
    let batch = Uuid::new_v4().simple().to_string();

    DAILY_TEMPLATES
        .iter()
        .enumerate()
        .map(|(index, template)| {
            let (req_id, req_kind, req_target, req_description) = template.requirement;
            Mission {
                id: format!("daily_{}_{}", &batch[..12], index),
                title: template.title.to_string(),
                description: template.description.to_string(),
                icon: template.icon.to_string(),
                kind: MissionType::Daily,
                difficulty: template.difficulty,
                point_reward: scale_reward(template.point_reward, level),
                xp_reward: scale_reward(template.xp_reward, level),
                expires_at,
                requirements: vec![MissionRequirement::new(
                    req_id,
                    req_kind,
                    req_target,
                    req_description,
                )],
                status: MissionStatus::Active,
                progress: 0,
                completed_at: None,
            }
        })
        .collect()
}

/// Aggregate counts over a set of missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSummary {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub expired: usize,
    /// Completed share as a rounded percentage
    pub completion_rate: u8,
}

/// Summarize mission states.
pub fn mission_progress_summary<'a>(
    missions: impl IntoIterator<Item = &'a Mission>,
) -> MissionSummary {
    let mut summary = MissionSummary::default();
    for mission in missions {
        summary.total += 1;
        match mission.status {
            MissionStatus::Completed => summary.completed += 1,
            MissionStatus::Active => summary.active += 1,
            MissionStatus::Expired => summary.expired += 1,
            MissionStatus::Locked => {}
        }
    }
    if summary.total > 0 {
        summary.completion_rate =
            ((summary.completed as f64 / summary.total as f64) * 100.0).round() as u8;
    }
    summary
}
