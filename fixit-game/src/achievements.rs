//! Achievement definitions and the rules that award them.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::catalog::{Catalog, Phase, Room};
use crate::error::{CatalogError, GameError};
use crate::progression::ProgressionRecord;
use crate::unlocks::calculate_phase;

const DEFAULT_ACHIEVEMENTS_DATA: &str = include_str!("../assets/data/achievements.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Streak,
    Mastery,
    Exploration,
    Speed,
    Perfect,
}

/// Condition under which an achievement is awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementRule {
    ChallengesCompleted { count: usize },
    /// Judged on the longest streak so a later reset does not matter.
    StreakAtLeast { days: u32 },
    DailyGoalMet,
    PerfectCompletions { count: usize },
    RoomMastered { room: Room },
    PhaseReached { phase: Phase },
    LevelReached { level: u32 },
    SkillsUnlocked { count: usize },
}

impl AchievementRule {
    #[must_use]
    pub fn is_met(&self, record: &ProgressionRecord, catalog: &Catalog) -> bool {
        let completed = &record.completed_challenges;
        match self {
            Self::ChallengesCompleted { count } => completed.len() >= *count,
            Self::StreakAtLeast { days } => record.streak.longest >= *days,
            Self::DailyGoalMet => record.daily_progress.goal_met,
            Self::PerfectCompletions { count } => record.perfect_completions() >= *count,
            Self::RoomMastered { room } => {
                let mut in_room = catalog.challenges_in_room(*room).peekable();
                in_room.peek().is_some() && in_room.all(|c| completed.contains(&c.id))
            }
            Self::PhaseReached { phase } => calculate_phase(catalog, completed) >= *phase,
            Self::LevelReached { level } => record.level >= *level,
            Self::SkillsUnlocked { count } => record.unlocked_skills.len() >= *count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub category: AchievementCategory,
    pub rule: AchievementRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AchievementCatalog {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_ACHIEVEMENTS_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static ACHIEVEMENTS: OnceLock<AchievementCatalog> = OnceLock::new();
        ACHIEVEMENTS.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns [`GameError::UnknownAchievement`] if no achievement has this id.
    pub fn get(&self, id: &str) -> Result<&Achievement, GameError> {
        self.achievements
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| GameError::UnknownAchievement(id.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] when two achievements share an id.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for achievement in &self.achievements {
            if !seen.insert(achievement.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "achievement",
                    id: achievement.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Achievements whose rule is met but which the record does not hold yet.
    pub fn newly_earned<'a>(
        &'a self,
        record: &'a ProgressionRecord,
        catalog: &'a Catalog,
    ) -> impl Iterator<Item = &'a Achievement> + 'a {
        self.achievements.iter().filter(move |a| {
            !record.has_achievement(&a.id) && a.rule.is_met(record, catalog)
        })
    }
}

/// Record an achievement. `Ok(None)` when it is already held.
///
/// # Errors
///
/// Returns [`GameError::UnknownAchievement`] for ids not in `achievements`.
pub fn unlock_achievement(
    record: &ProgressionRecord,
    achievements: &AchievementCatalog,
    achievement_id: &str,
) -> Result<Option<ProgressionRecord>, GameError> {
    achievements.get(achievement_id)?;
    if record.has_achievement(achievement_id) {
        return Ok(None);
    }
    Ok(Some(record.with_achievement(achievement_id)))
}

/// Award every achievement whose rule is now met.
#[must_use]
pub fn unlock_earned_achievements(
    record: &ProgressionRecord,
    catalog: &Catalog,
    achievements: &AchievementCatalog,
) -> (ProgressionRecord, Vec<String>) {
    let earned: Vec<String> = achievements
        .newly_earned(record, catalog)
        .map(|a| a.id.clone())
        .collect();
    let next = earned
        .iter()
        .fold(record.clone(), |acc, id| acc.with_achievement(id));
    (next, earned)
}
