//! Achievement definitions.

use super::{Achievement, AchievementCategory, Condition, ConditionType, Rarity};

/// Get the built-in achievement catalog
pub fn default_catalog() -> Vec<Achievement> {
    let mut achievements = Vec::new();

    achievements.extend(purchase_achievements());
    achievements.extend(streak_achievements());
    achievements.extend(social_achievements());
    achievements.extend(exploration_achievements());
    achievements.extend(milestone_achievements());

    achievements
}

fn purchase_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first_purchase",
            "First Steps",
            "Make your first purchase",
            Rarity::Common,
            AchievementCategory::Purchase,
            Condition::new(ConditionType::Count, 1.0, "purchases"),
        )
        .with_rewards(50, 25),
        Achievement::new(
            "regular_customer",
            "Regular Customer",
            "Make 10 purchases",
            Rarity::Rare,
            AchievementCategory::Purchase,
            Condition::new(ConditionType::Count, 10.0, "purchases"),
        )
        .with_rewards(200, 100),
        Achievement::new(
            "big_spender",
            "Big Spender",
            "Spend a total of $1,000",
            Rarity::Epic,
            AchievementCategory::Purchase,
            Condition::new(ConditionType::Amount, 1000.0, "total_spent"),
        )
        .with_rewards(500, 250),
    ]
}

fn streak_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "week_streak",
            "On Fire",
            "Visit 7 days in a row",
            Rarity::Rare,
            AchievementCategory::Streak,
            Condition::new(ConditionType::Streak, 7.0, "daily_visit"),
        )
        .with_rewards(150, 75),
        Achievement::new(
            "month_streak",
            "Unstoppable",
            "Visit 30 days in a row",
            Rarity::Legendary,
            AchievementCategory::Streak,
            Condition::new(ConditionType::Streak, 30.0, "daily_visit"),
        )
        .with_rewards(1000, 500),
        Achievement::new(
            "mission_streak",
            "Mission Machine",
            "Complete 5 missions back to back",
            Rarity::Epic,
            AchievementCategory::Streak,
            Condition::new(ConditionType::Streak, 5.0, "mission_complete"),
        )
        .with_rewards(300, 150),
    ]
}

fn social_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first_share",
            "Word of Mouth",
            "Share an achievement on social media",
            Rarity::Common,
            AchievementCategory::Social,
            Condition::new(ConditionType::Count, 1.0, "social_shares"),
        )
        .with_rewards(25, 10),
        Achievement::new(
            "ambassador",
            "Ambassador",
            "Refer 5 friends",
            Rarity::Epic,
            AchievementCategory::Social,
            Condition::new(ConditionType::Count, 5.0, "referrals"),
        )
        .with_rewards(500, 200),
    ]
}

fn exploration_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "wallet_connected",
            "Connected",
            "Connect a wallet for the first time",
            Rarity::Common,
            AchievementCategory::Exploration,
            Condition::new(ConditionType::Count, 1.0, "wallet_connections"),
        )
        .with_rewards(20, 10),
        Achievement::new(
            "merchant_explorer",
            "Explorer",
            "Scan QR codes from 3 different merchants",
            Rarity::Rare,
            AchievementCategory::Exploration,
            Condition::new(ConditionType::Count, 3.0, "merchants_visited"),
        )
        .with_rewards(100, 50),
    ]
}

fn milestone_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "points_collector",
            "Points Collector",
            "Earn 5,000 loyalty points",
            Rarity::Rare,
            AchievementCategory::Milestone,
            Condition::new(ConditionType::Amount, 5000.0, "points_earned"),
        )
        .with_rewards(250, 100),
        Achievement::new(
            "early_adopter",
            "Early Adopter",
            "Be part of the program after its public launch",
            Rarity::Legendary,
            AchievementCategory::Milestone,
            // 2024-01-01T00:00:00Z
            Condition::new(ConditionType::Date, 1_704_067_200_000.0, "launch_date"),
        )
        .with_rewards(1000, 500),
    ]
}
