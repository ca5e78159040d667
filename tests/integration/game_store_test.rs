//! Integration tests for the game state store.
//!
//! Exercises the full event flow: activity → store transition → snapshot,
//! and the persisted record across store instances.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use loyaltymax::gamification::{
    default_catalog, Difficulty, LevelConfig, Mission, MissionRequirement, MissionStatus,
    MissionType, RequirementType, StreakType,
};
use loyaltymax::store::{
    GameError, GameStore, KeyValueStore, MemoryStore, MissionOutcome, SqliteStore,
    GAME_STATE_KEY,
};
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

fn memory() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

fn weekly_mission(id: &str, expires_at: DateTime<Utc>) -> Mission {
    Mission {
        id: id.to_string(),
        title: "Weekly Regular".to_string(),
        description: "Visit three times this week".to_string(),
        icon: "🗓️".to_string(),
        kind: MissionType::Weekly,
        difficulty: Difficulty::Medium,
        point_reward: 150,
        xp_reward: 60,
        expires_at,
        requirements: vec![
            MissionRequirement::new("visits", RequirementType::VisitCount, 3.0, "Visit 3 times"),
            MissionRequirement::new("review", RequirementType::Review, 1.0, "Leave a review"),
        ],
        status: MissionStatus::Active,
        progress: 0,
        completed_at: None,
    }
}

#[test]
fn test_level_thresholds() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    assert_eq!(store.user_level().level, 1);
    assert_eq!(store.user_level().next_level_xp, 100);

    store.add_xp(100);
    assert_eq!(store.user_level().level, 2);

    let award = store.add_xp(150);
    assert_eq!(store.total_xp(), 250);
    assert_eq!(store.user_level().level, 3);
    assert!(award.leveled_up());
    assert_eq!(award.level_before, 2);
}

#[test]
fn test_level_never_exceeds_max() {
    let config = LevelConfig {
        max_level: 5,
        ..Default::default()
    };
    let mut store = GameStore::new(memory(), config);
    store.add_xp(10_000_000);
    assert_eq!(store.user_level().level, 5);
    assert!(store.user_level().is_max_level());
}

#[test]
fn test_complete_mission_is_idempotent() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    let mission_id = store.refresh_daily_missions(now())[0].id.clone();
    let xp_reward = store.state().mission(&mission_id).unwrap().xp_reward;

    let first = store.complete_mission(&mission_id, now()).unwrap();
    let MissionOutcome::Completed { award, .. } = first else {
        panic!("expected completion, got {:?}", first);
    };
    assert_eq!(award.amount, xp_reward);
    let xp_after_first = store.total_xp();

    let second = store
        .complete_mission(&mission_id, now() + Duration::minutes(5))
        .unwrap();
    assert_eq!(second, MissionOutcome::Unchanged(MissionStatus::Completed));
    assert_eq!(store.total_xp(), xp_after_first);

    let mission = store.state().mission(&mission_id).unwrap();
    assert_eq!(mission.progress, 100);
    assert_eq!(mission.completed_at, Some(now()));
}

#[test]
fn test_progress_to_full_completes_once() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    let mission_id = store.refresh_daily_missions(now())[1].id.clone();

    assert_eq!(
        store.update_mission_progress(&mission_id, 40.0, now()).unwrap(),
        MissionOutcome::Progressed(40)
    );
    assert_eq!(store.total_xp(), 0);

    let outcome = store.update_mission_progress(&mission_id, 100.0, now()).unwrap();
    assert!(matches!(outcome, MissionOutcome::Completed { .. }));
    let xp = store.total_xp();
    assert!(xp > 0);

    store.update_mission_progress(&mission_id, 100.0, now()).unwrap();
    assert_eq!(store.total_xp(), xp);
}

#[test]
fn test_progress_just_short_of_full_stays_active() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    let mission_id = store.refresh_daily_missions(now())[1].id.clone();

    assert_eq!(
        store.update_mission_progress(&mission_id, 99.5, now()).unwrap(),
        MissionOutcome::Progressed(99)
    );
    assert_eq!(store.total_xp(), 0);

    let mission = store.state().mission(&mission_id).unwrap();
    assert_eq!(mission.status, MissionStatus::Active);
    assert_eq!(mission.progress, 99);
}

#[test]
fn test_requirement_short_of_target_stays_active() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    // "Spend & Earn": purchase target of 20
    let mission_id = store.refresh_daily_missions(now())[1].id.clone();

    assert_eq!(
        store
            .update_requirement(&mission_id, "purchase", 19.9, now())
            .unwrap(),
        MissionOutcome::Progressed(99)
    );
    assert_eq!(store.total_xp(), 0);
    assert_eq!(
        store.state().mission(&mission_id).unwrap().status,
        MissionStatus::Active
    );

    let outcome = store
        .update_requirement(&mission_id, "purchase", 20.0, now())
        .unwrap();
    assert!(matches!(outcome, MissionOutcome::Completed { .. }));
    assert!(store.total_xp() > 0);
}

#[test]
fn test_progress_input_is_clamped() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    let missions: Vec<String> = store
        .refresh_daily_missions(now())
        .iter()
        .map(|m| m.id.clone())
        .collect();

    assert_eq!(
        store.update_mission_progress(&missions[0], -5.0, now()).unwrap(),
        MissionOutcome::Progressed(0)
    );
    assert_eq!(
        store
            .update_mission_progress(&missions[0], f64::NAN, now())
            .unwrap(),
        MissionOutcome::Progressed(0)
    );
    assert_eq!(store.state().mission(&missions[0]).unwrap().progress, 0);
    assert_eq!(store.total_xp(), 0);

    let outcome = store
        .update_mission_progress(&missions[1], 250.0, now())
        .unwrap();
    assert!(matches!(outcome, MissionOutcome::Completed { .. }));
    assert_eq!(store.state().mission(&missions[1]).unwrap().progress, 100);
}

#[test]
fn test_progress_after_deadline_expires_mission() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    let mission_id = store.refresh_daily_missions(now())[0].id.clone();
    let late = now() + Duration::hours(24) + Duration::seconds(1);

    assert_eq!(
        store.update_mission_progress(&mission_id, 100.0, late).unwrap(),
        MissionOutcome::Expired
    );
    assert_eq!(store.total_xp(), 0);
    assert_eq!(
        store.state().mission(&mission_id).unwrap().status,
        MissionStatus::Expired
    );

    assert_eq!(
        store.update_mission_progress(&mission_id, 100.0, late).unwrap(),
        MissionOutcome::Unchanged(MissionStatus::Expired)
    );
}

#[test]
fn test_requirement_after_deadline_expires_mission() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    store
        .assign_mission(weekly_mission("weekly_regular", now() + Duration::days(7)))
        .unwrap();
    let late = now() + Duration::days(8);

    assert_eq!(
        store
            .update_requirement("weekly_regular", "visits", 3.0, late)
            .unwrap(),
        MissionOutcome::Expired
    );
    assert_eq!(
        store
            .update_requirement("weekly_regular", "review", 1.0, late)
            .unwrap(),
        MissionOutcome::Unchanged(MissionStatus::Expired)
    );
    assert_eq!(store.total_xp(), 0);

    let mission = store.state().mission("weekly_regular").unwrap();
    assert_eq!(mission.status, MissionStatus::Expired);
    assert_eq!(mission.progress, 0);
}

#[test]
fn test_requirements_drive_progress() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    store
        .assign_mission(weekly_mission("weekly_regular", now() + Duration::days(7)))
        .unwrap();

    let outcome = store
        .update_requirement("weekly_regular", "visits", 3.0, now())
        .unwrap();
    assert_eq!(outcome, MissionOutcome::Progressed(50));

    let outcome = store
        .update_requirement("weekly_regular", "review", 1.0, now())
        .unwrap();
    assert!(matches!(outcome, MissionOutcome::Completed { point_reward: 150, .. }));

    assert!(matches!(
        store.update_requirement("weekly_regular", "missing", 1.0, now()),
        Ok(MissionOutcome::Unchanged(MissionStatus::Completed))
    ));
    assert!(matches!(
        store.update_requirement("nope", "visits", 1.0, now()),
        Err(GameError::MissionNotFound(_))
    ));
}

#[test]
fn test_refresh_keeps_weekly_missions() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    store
        .assign_mission(weekly_mission("weekly_regular", now() + Duration::days(7)))
        .unwrap();

    let first: Vec<String> = store
        .refresh_daily_missions(now())
        .iter()
        .map(|m| m.id.clone())
        .collect();
    let second: Vec<String> = store
        .refresh_daily_missions(now() + Duration::days(1))
        .iter()
        .map(|m| m.id.clone())
        .collect();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert!(first.iter().all(|id| !second.contains(id)));
    assert!(store.state().mission("weekly_regular").is_some());
    assert_eq!(store.state().weekly_missions.len(), 1);
}

#[test]
fn test_overdue_missions_expire() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    store.refresh_daily_missions(now());
    store
        .assign_mission(weekly_mission("weekly_regular", now() + Duration::days(7)))
        .unwrap();

    let later = now() + Duration::hours(25);
    assert_eq!(store.expire_missions(later), 3);
    assert_eq!(store.expire_missions(later), 0);

    let summary = store.state().mission_summary();
    assert_eq!(summary.expired, 3);
    assert_eq!(summary.active, 1);

    let weekly_late = now() + Duration::days(8);
    assert_eq!(
        store.complete_mission("weekly_regular", weekly_late).unwrap(),
        MissionOutcome::Expired
    );
    assert_eq!(store.total_xp(), 0);
}

#[test]
fn test_streak_activity_and_bonus() {
    let mut store = GameStore::new(memory(), LevelConfig::default());

    let mut at = now();
    for _ in 0..3 {
        store.record_streak_activity(StreakType::DailyVisit, at);
        at += Duration::hours(24);
    }
    let streak = store.state().streak(StreakType::DailyVisit).unwrap();
    assert_eq!(streak.current, 3);
    assert_eq!(streak.multiplier, 1.5);

    // Level 1 adds 5%, the daily streak adds 50%
    let last = at - Duration::hours(24);
    assert_eq!(store.bonus_points(100, last), 157);

    let broken = store.record_streak_activity(StreakType::DailyVisit, last + Duration::hours(50));
    assert_eq!(broken.current, 1);
    assert_eq!(broken.best, 3);
}

#[test]
fn test_streak_metrics_unlock_achievements() {
    let mut store = GameStore::new(memory(), LevelConfig::default());

    let mut at = now();
    for _ in 0..7 {
        store.record_streak_activity(StreakType::DailyVisit, at);
        at += Duration::hours(24);
    }

    let mut metrics = HashMap::new();
    metrics.insert("purchases".to_string(), 1.0);
    let unlocked = store.evaluate_achievements(&metrics, at);

    assert!(unlocked.contains(&"week_streak".to_string()));
    assert!(unlocked.contains(&"first_purchase".to_string()));
    assert!(store.state().is_unlocked("week_streak"));

    let xp = store.total_xp();
    assert!(store.evaluate_achievements(&metrics, at).is_empty());
    assert_eq!(store.total_xp(), xp);
}

#[test]
fn test_unlock_unknown_achievement() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    assert!(matches!(
        store.unlock_achievement("does_not_exist"),
        Err(GameError::AchievementNotFound(_))
    ));
    assert!(store.unlock_achievement("first_share").unwrap().is_some());
    assert!(store.unlock_achievement("first_share").unwrap().is_none());
}

#[test]
fn test_snapshots_are_stable() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    let before = store.snapshot();
    store.add_xp(500);
    assert_eq!(before.total_xp, 0);
    assert_eq!(store.snapshot().total_xp, 500);
}

#[test]
fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("loyaltymax.db");

    let (mission_id, total_xp, unlocked_at) = {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).unwrap());
        let mut store =
            GameStore::new(persistence, LevelConfig::default()).with_autosave(true);
        store.add_xp(260);
        store.unlock_achievement("wallet_connected").unwrap();
        store.record_streak_activity(StreakType::DailyVisit, now());
        let mission_id = store.refresh_daily_missions(now())[0].id.clone();
        store.complete_mission(&mission_id, now()).unwrap();
        let unlocked_at = store
            .state()
            .achievement("wallet_connected")
            .unwrap()
            .unlocked_at;
        (mission_id, store.total_xp(), unlocked_at)
    };

    let persistence: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let store = GameStore::load(persistence, LevelConfig::default(), default_catalog());

    assert_eq!(store.total_xp(), total_xp);
    assert_eq!(store.user_level().level, 3);
    assert!(store.state().is_unlocked("wallet_connected"));
    let achievement = store.state().achievement("wallet_connected").unwrap();
    assert!(achievement.unlocked);
    assert!(unlocked_at.is_some());
    assert_eq!(achievement.unlocked_at, unlocked_at);
    assert_eq!(
        store.state().streak(StreakType::DailyVisit).unwrap().current,
        1
    );
    assert_eq!(
        store.state().mission(&mission_id).unwrap().status,
        MissionStatus::Completed
    );
}

#[test]
fn test_corrupt_record_starts_fresh() {
    let persistence = memory();
    persistence.set(GAME_STATE_KEY, "{\"totalXP\": \"lots\"").unwrap();

    let store = GameStore::load(persistence, LevelConfig::default(), default_catalog());
    assert_eq!(store.total_xp(), 0);
    assert_eq!(store.user_level().level, 1);
}

#[test]
fn test_reset_clears_progress() {
    let mut store = GameStore::new(memory(), LevelConfig::default());
    store.add_xp(1000);
    store.unlock_achievement("first_purchase").unwrap();
    store.refresh_daily_missions(now());

    store.reset(now());
    assert_eq!(store.total_xp(), 0);
    assert!(store.state().unlocked_achievements.is_empty());
    assert!(store.state().missions().next().is_none());
    assert_eq!(store.state().achievements.len(), default_catalog().len());
}
