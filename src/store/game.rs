//! Game state store.
//!
//! [`GameStore`] is the single owner of gamification state. Every operation
//! works on a private copy of the current [`GameState`] and swaps the new
//! snapshot in only once it is complete, so readers holding a snapshot never
//! observe a half-applied transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::persistence::{load_json, save_json, KeyValueStore, PersistenceError, GAME_STATE_KEY};
use crate::gamification::{
    calculate_bonus_points, default_catalog, generate_daily_missions, mission_progress_summary,
    update_streak, Achievement, Leaderboard, LevelConfig, Mission, MissionStatus, MissionSummary,
    MissionType, Streak, StreakType, UserLevel,
};

/// Game store errors.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Requirement {requirement} not found on mission {mission}")]
    RequirementNotFound { mission: String, requirement: String },

    #[error("Achievement not found: {0}")]
    AchievementNotFound(String),

    #[error("Mission already exists: {0}")]
    DuplicateMission(String),
}

/// Immutable snapshot of all gamification state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub user_level: UserLevel,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub achievements: Vec<Achievement>,
    /// Unlocked achievement ids, in unlock order
    pub unlocked_achievements: Vec<String>,
    pub daily_missions: Vec<Mission>,
    pub weekly_missions: Vec<Mission>,
    pub special_missions: Vec<Mission>,
    pub streaks: Vec<Streak>,
    pub leaderboards: Vec<Leaderboard>,
    pub error: Option<String>,
}

impl GameState {
    /// Starting state for a new user.
    pub fn initial(
        catalog: Vec<Achievement>,
        level_config: &LevelConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_level: level_config.calculate_level(0),
            total_xp: 0,
            achievements: catalog,
            unlocked_achievements: Vec::new(),
            daily_missions: Vec::new(),
            weekly_missions: Vec::new(),
            special_missions: Vec::new(),
            streaks: StreakType::ALL
                .iter()
                .map(|kind| Streak::new(*kind, now))
                .collect(),
            leaderboards: Vec::new(),
            error: None,
        }
    }

    /// All missions across slots.
    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.daily_missions
            .iter()
            .chain(self.weekly_missions.iter())
            .chain(self.special_missions.iter())
    }

    pub fn mission(&self, id: &str) -> Option<&Mission> {
        self.missions().find(|m| m.id == id)
    }

    fn mission_mut(&mut self, id: &str) -> Option<&mut Mission> {
        self.daily_missions
            .iter_mut()
            .chain(self.weekly_missions.iter_mut())
            .chain(self.special_missions.iter_mut())
            .find(|m| m.id == id)
    }

    pub fn streak(&self, kind: StreakType) -> Option<&Streak> {
        self.streaks.iter().find(|s| s.kind == kind)
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked_achievements.iter().any(|id| id == achievement_id)
    }

    pub fn mission_summary(&self) -> MissionSummary {
        mission_progress_summary(self.missions())
    }

    fn grant_xp(&mut self, amount: u64, level_config: &LevelConfig) -> XpAward {
        let level_before = self.user_level.level;
        self.total_xp = self.total_xp.saturating_add(amount);
        self.user_level = level_config.calculate_level(self.total_xp);

        XpAward {
            amount,
            level_before,
            level_after: self.user_level.level,
        }
    }

    fn advance_streak(&mut self, kind: StreakType, at: DateTime<Utc>) -> Streak {
        match self.streaks.iter_mut().find(|s| s.kind == kind) {
            Some(streak) => {
                *streak = update_streak(streak, at);
                streak.clone()
            }
            None => {
                let streak = update_streak(&Streak::new(kind, at), at);
                self.streaks.push(streak.clone());
                streak
            }
        }
    }

    fn mark_unlocked(
        &mut self,
        index: usize,
        at: DateTime<Utc>,
        level_config: &LevelConfig,
    ) -> XpAward {
        let achievement = &mut self.achievements[index];
        achievement.unlocked = true;
        achievement.unlocked_at = Some(at);
        achievement.progress = 100;

        let id = achievement.id.clone();
        let xp = achievement.xp;
        self.unlocked_achievements.push(id);
        self.grant_xp(xp, level_config)
    }

    /// Finish an active mission, granting its rewards once.
    fn complete_mission(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        level_config: &LevelConfig,
    ) -> Result<MissionOutcome, GameError> {
        let mission = self
            .mission_mut(id)
            .ok_or_else(|| GameError::MissionNotFound(id.to_string()))?;

        if mission.status != MissionStatus::Active {
            return Ok(MissionOutcome::Unchanged(mission.status));
        }
        if mission.is_expired(now) {
            mission.status = MissionStatus::Expired;
            return Ok(MissionOutcome::Expired);
        }

        mission.status = MissionStatus::Completed;
        mission.progress = 100;
        mission.completed_at = Some(now);
        let (xp_reward, point_reward) = (mission.xp_reward, mission.point_reward);

        let award = self.grant_xp(xp_reward, level_config);
        self.advance_streak(StreakType::MissionComplete, now);

        Ok(MissionOutcome::Completed {
            award,
            point_reward,
        })
    }

    /// Metric values derived from the state itself (current streak lengths).
    pub fn derived_metrics(&self) -> HashMap<String, f64> {
        self.streaks
            .iter()
            .map(|s| (s.kind.as_str().to_string(), s.current as f64))
            .collect()
    }
}

/// XP granted by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub amount: u64,
    pub level_before: u32,
    pub level_after: u32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Result of a mission transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissionOutcome {
    /// Mission moved to completed; rewards were granted
    Completed { award: XpAward, point_reward: u64 },
    /// Progress recorded, mission still active
    Progressed(u8),
    /// Mission ran out of time and is now expired
    Expired,
    /// Mission was not active; nothing changed
    Unchanged(MissionStatus),
}

/// Subset of state written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedGame {
    #[serde(rename = "totalXP")]
    total_xp: u64,
    #[serde(default)]
    unlocked_achievements: Vec<String>,
    /// Unlock time per achievement id
    #[serde(default)]
    unlocked_at: HashMap<String, DateTime<Utc>>,
    #[serde(default)]
    streaks: Vec<Streak>,
    #[serde(default)]
    daily_missions: Vec<Mission>,
    #[serde(default)]
    weekly_missions: Vec<Mission>,
    #[serde(default)]
    special_missions: Vec<Mission>,
    #[serde(default)]
    user_level: Option<UserLevel>,
}

impl PersistedGame {
    fn from_state(state: &GameState) -> Self {
        Self {
            total_xp: state.total_xp,
            unlocked_achievements: state.unlocked_achievements.clone(),
            unlocked_at: state
                .achievements
                .iter()
                .filter_map(|a| a.unlocked_at.map(|at| (a.id.clone(), at)))
                .collect(),
            streaks: state.streaks.clone(),
            daily_missions: state.daily_missions.clone(),
            weekly_missions: state.weekly_missions.clone(),
            special_missions: state.special_missions.clone(),
            user_level: Some(state.user_level.clone()),
        }
    }

    fn into_state(
        self,
        catalog: Vec<Achievement>,
        level_config: &LevelConfig,
        now: DateTime<Utc>,
    ) -> GameState {
        let mut state = GameState::initial(catalog, level_config, now);

        state.total_xp = self.total_xp;
        // Level is always derived from XP, never trusted from storage.
        state.user_level = level_config.calculate_level(self.total_xp);

        for achievement in state.achievements.iter_mut() {
            if self.unlocked_achievements.contains(&achievement.id) {
                achievement.unlocked = true;
                achievement.progress = 100;
                achievement.unlocked_at = self.unlocked_at.get(&achievement.id).copied();
            }
        }
        state.unlocked_achievements = self.unlocked_achievements;

        for streak in self.streaks {
            if let Some(slot) = state.streaks.iter_mut().find(|s| s.kind == streak.kind) {
                *slot = streak;
            }
        }

        state.daily_missions = self.daily_missions;
        state.weekly_missions = self.weekly_missions;
        state.special_missions = self.special_missions;
        state
    }
}

/// Owner of gamification state.
pub struct GameStore {
    state: Arc<GameState>,
    level_config: LevelConfig,
    persistence: Arc<dyn KeyValueStore>,
    autosave: bool,
}

impl GameStore {
    /// Create a store with fresh state and the default achievement catalog.
    pub fn new(persistence: Arc<dyn KeyValueStore>, level_config: LevelConfig) -> Self {
        let state = GameState::initial(default_catalog(), &level_config, Utc::now());
        Self {
            state: Arc::new(state),
            level_config,
            persistence,
            autosave: false,
        }
    }

    /// Restore a store from persistence.
    ///
    /// A missing or unreadable record yields fresh state; the failure is
    /// logged, not returned.
    pub fn load(
        persistence: Arc<dyn KeyValueStore>,
        level_config: LevelConfig,
        catalog: Vec<Achievement>,
    ) -> Self {
        let now = Utc::now();
        let state = match load_json::<PersistedGame>(persistence.as_ref(), GAME_STATE_KEY) {
            Ok(Some(record)) => {
                tracing::debug!("Restored game state ({} XP)", record.total_xp);
                record.into_state(catalog, &level_config, now)
            }
            Ok(None) => GameState::initial(catalog, &level_config, now),
            Err(e) => {
                tracing::warn!("Could not restore game state, starting fresh: {}", e);
                GameState::initial(catalog, &level_config, now)
            }
        };

        Self {
            state: Arc::new(state),
            level_config,
            persistence,
            autosave: false,
        }
    }

    /// Save after every state change.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Current snapshot. Cheap to clone and safe to keep.
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn user_level(&self) -> &UserLevel {
        &self.state.user_level
    }

    pub fn total_xp(&self) -> u64 {
        self.state.total_xp
    }

    pub fn level_config(&self) -> &LevelConfig {
        &self.level_config
    }

    /// Write the persisted record.
    pub fn save(&self) -> Result<(), PersistenceError> {
        save_json(
            self.persistence.as_ref(),
            GAME_STATE_KEY,
            &PersistedGame::from_state(&self.state),
        )
    }

    fn commit(&mut self, next: GameState) {
        self.state = Arc::new(next);
        if self.autosave {
            if let Err(e) = self.save() {
                tracing::warn!("Autosave failed: {}", e);
            }
        }
    }

    fn draft(&self) -> GameState {
        (*self.state).clone()
    }

    /// Add experience and recompute the level.
    pub fn add_xp(&mut self, amount: u64) -> XpAward {
        let mut next = self.draft();
        let award = next.grant_xp(amount, &self.level_config);
        if award.leveled_up() {
            tracing::info!(
                "Level up: {} -> {} ({})",
                award.level_before,
                award.level_after,
                next.user_level.title
            );
        }
        self.commit(next);
        award
    }

    /// Unlock an achievement, granting its XP once.
    ///
    /// Returns `Ok(None)` when it was already unlocked.
    pub fn unlock_achievement(&mut self, id: &str) -> Result<Option<XpAward>, GameError> {
        if self.state.is_unlocked(id) {
            return Ok(None);
        }

        let index = self
            .state
            .achievements
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| GameError::AchievementNotFound(id.to_string()))?;

        let mut next = self.draft();
        let award = next.mark_unlocked(index, Utc::now(), &self.level_config);
        tracing::info!("Achievement unlocked: {} (+{} XP)", id, award.amount);
        self.commit(next);

        Ok(Some(award))
    }

    /// Recompute progress for every achievement and unlock those whose
    /// condition is now met.
    ///
    /// Streak lengths are available as metrics named after the streak type
    /// unless `metrics` already provides them. Returns newly unlocked ids.
    pub fn evaluate_achievements(
        &mut self,
        metrics: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut merged = self.state.derived_metrics();
        merged.extend(metrics.iter().map(|(k, v)| (k.clone(), *v)));

        let mut next = self.draft();
        let mut newly_unlocked = Vec::new();

        for index in 0..next.achievements.len() {
            let achievement = &mut next.achievements[index];
            if achievement.unlocked {
                continue;
            }

            let check = achievement.check(&merged, now);
            achievement.progress = check.progress;

            if check.unlocked && !next.is_unlocked(&next.achievements[index].id) {
                next.mark_unlocked(index, now, &self.level_config);
                newly_unlocked.push(next.achievements[index].id.clone());
            }
        }

        for id in &newly_unlocked {
            tracing::info!("Achievement unlocked: {}", id);
        }

        if next != *self.state {
            self.commit(next);
        }
        newly_unlocked
    }

    /// Complete a mission. Only active missions transition; repeated calls
    /// are no-ops.
    pub fn complete_mission(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<MissionOutcome, GameError> {
        let mut next = self.draft();
        let outcome = next.complete_mission(id, now, &self.level_config)?;

        match outcome {
            MissionOutcome::Completed { award, point_reward } => {
                tracing::info!(
                    "Mission {} completed (+{} XP, +{} points)",
                    id,
                    award.amount,
                    point_reward
                );
                self.commit(next);
            }
            MissionOutcome::Expired => {
                tracing::debug!("Mission {} expired before completion", id);
                self.commit(next);
            }
            _ => {}
        }

        Ok(outcome)
    }

    /// Set mission progress (clamped to 0..=100); reaching 100 completes it.
    pub fn update_mission_progress(
        &mut self,
        id: &str,
        progress: f64,
        now: DateTime<Utc>,
    ) -> Result<MissionOutcome, GameError> {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 100.0)
        };

        let mut next = self.draft();
        let mission = next
            .mission_mut(id)
            .ok_or_else(|| GameError::MissionNotFound(id.to_string()))?;

        if mission.status != MissionStatus::Active {
            return Ok(MissionOutcome::Unchanged(mission.status));
        }
        if mission.is_expired(now) {
            mission.status = MissionStatus::Expired;
            self.commit(next);
            return Ok(MissionOutcome::Expired);
        }
        if progress >= 100.0 {
            let outcome = next.complete_mission(id, now, &self.level_config)?;
            self.commit(next);
            return Ok(outcome);
        }

        let stored = progress.floor() as u8;
        mission.progress = stored;
        self.commit(next);
        Ok(MissionOutcome::Progressed(stored))
    }

    /// Record a requirement's current value and derive mission progress
    /// from all requirements.
    pub fn update_requirement(
        &mut self,
        mission_id: &str,
        requirement_id: &str,
        current: f64,
        now: DateTime<Utc>,
    ) -> Result<MissionOutcome, GameError> {
        let mut next = self.draft();
        let mission = next
            .mission_mut(mission_id)
            .ok_or_else(|| GameError::MissionNotFound(mission_id.to_string()))?;

        if mission.status != MissionStatus::Active {
            return Ok(MissionOutcome::Unchanged(mission.status));
        }
        if mission.is_expired(now) {
            mission.status = MissionStatus::Expired;
            self.commit(next);
            return Ok(MissionOutcome::Expired);
        }

        let requirement = mission
            .requirements
            .iter_mut()
            .find(|r| r.id == requirement_id)
            .ok_or_else(|| GameError::RequirementNotFound {
                mission: mission_id.to_string(),
                requirement: requirement_id.to_string(),
            })?;
        requirement.current = current.max(0.0);

        let progress = mission.requirement_progress();
        mission.progress = progress;

        if mission.requirements_met() {
            let outcome = next.complete_mission(mission_id, now, &self.level_config)?;
            self.commit(next);
            return Ok(outcome);
        }

        self.commit(next);
        Ok(MissionOutcome::Progressed(progress))
    }

    /// Replace the daily mission slot with a freshly generated set.
    ///
    /// Weekly and special missions are left untouched.
    pub fn refresh_daily_missions(&mut self, now: DateTime<Utc>) -> &[Mission] {
        let mut next = self.draft();
        next.daily_missions = generate_daily_missions(next.user_level.level, now);
        tracing::debug!(
            "Generated {} daily missions for level {}",
            next.daily_missions.len(),
            next.user_level.level
        );
        self.commit(next);
        &self.state.daily_missions
    }

    /// Place a mission in the slot matching its type.
    pub fn assign_mission(&mut self, mission: Mission) -> Result<(), GameError> {
        if self.state.mission(&mission.id).is_some() {
            return Err(GameError::DuplicateMission(mission.id));
        }

        let mut next = self.draft();
        match mission.kind {
            MissionType::Daily => next.daily_missions.push(mission),
            MissionType::Weekly | MissionType::Monthly => next.weekly_missions.push(mission),
            MissionType::Special => next.special_missions.push(mission),
        }
        self.commit(next);
        Ok(())
    }

    /// Expire every active mission whose deadline has passed. Returns how
    /// many missions expired.
    pub fn expire_missions(&mut self, now: DateTime<Utc>) -> usize {
        let mut next = self.draft();
        let mut expired = 0;

        for mission in next
            .daily_missions
            .iter_mut()
            .chain(next.weekly_missions.iter_mut())
            .chain(next.special_missions.iter_mut())
        {
            if mission.is_active() && mission.is_expired(now) {
                mission.status = MissionStatus::Expired;
                expired += 1;
            }
        }

        if expired > 0 {
            tracing::debug!("{} missions expired", expired);
            self.commit(next);
        }
        expired
    }

    /// Register activity for a streak type.
    pub fn record_streak_activity(&mut self, kind: StreakType, at: DateTime<Utc>) -> Streak {
        let mut next = self.draft();
        let streak = next.advance_streak(kind, at);
        tracing::debug!("Streak {} now {} (x{})", kind, streak.current, streak.multiplier);
        self.commit(next);
        streak
    }

    /// Points after streak and level bonuses.
    pub fn bonus_points(&self, base_points: u64, now: DateTime<Utc>) -> u64 {
        calculate_bonus_points(
            base_points,
            self.state.user_level.level,
            &self.state.streaks,
            now,
        )
    }

    pub fn set_leaderboards(&mut self, leaderboards: Vec<Leaderboard>) {
        let mut next = self.draft();
        next.leaderboards = leaderboards;
        self.commit(next);
    }

    pub fn set_error(&mut self, error: Option<String>) {
        let mut next = self.draft();
        next.error = error;
        self.commit(next);
    }

    /// Reset to a brand-new user, keeping the achievement catalog.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        let catalog = self
            .state
            .achievements
            .iter()
            .cloned()
            .map(|mut a| {
                a.unlocked = false;
                a.unlocked_at = None;
                a.progress = 0;
                a
            })
            .collect();
        self.commit(GameState::initial(catalog, &self.level_config, now));
    }
}
