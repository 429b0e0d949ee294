//! The persisted progression record and the pure transitions applied to it.
//!
//! Every transition takes the current record by reference and returns a new
//! one; nothing here performs I/O or reads the clock.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::clock::Moment;
use crate::config::ProgressionConfig;

pub mod daily;
pub mod level;
pub mod skills;
pub mod streak;

pub use daily::{DailyProgress, record_completion, roll_over};
pub use level::{LevelProgress, level_for_xp, level_for_xp_in};
pub use skills::{SkillGap, skill_gap, try_unlock_skill, unlock_earned_skills};
pub use streak::{
    StreakMaintenance, StreakState, maintain_streak, update_streak, use_streak_freeze,
};

/// Per-challenge attempt history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeAttempt {
    pub challenge_id: String,
    pub attempts: u32,
    pub best_score: u32,
    pub completed: bool,
    /// Milliseconds since the Unix epoch.
    pub last_attempt: i64,
    pub hints_used: Vec<String>,
}

impl ChallengeAttempt {
    fn first(challenge_id: &str) -> Self {
        Self {
            challenge_id: challenge_id.to_string(),
            attempts: 0,
            best_score: 0,
            completed: false,
            last_attempt: 0,
            hints_used: Vec::new(),
        }
    }
}

/// Whether a completion was the first for its challenge or a repeat submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    First,
    /// Repeat of an already completed challenge; still rewarded.
    Replay,
}

impl CompletionKind {
    #[must_use]
    pub fn for_record(record: &ProgressionRecord, challenge_id: &str) -> Self {
        if record.is_completed(challenge_id) {
            Self::Replay
        } else {
            Self::First
        }
    }
}

/// A player's entire accumulated state, persisted as one JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecord {
    pub xp: u32,
    pub level: u32,
    pub completed_challenges: Vec<String>,
    pub unlocked_skills: Vec<String>,
    pub challenge_attempts: BTreeMap<String, ChallengeAttempt>,
    pub streak: StreakState,
    pub daily_progress: DailyProgress,
    #[serde(deserialize_with = "achievement_ids")]
    pub achievements: Vec<String>,
}

impl ProgressionRecord {
    /// Zero-valued record for a first run on `today`.
    #[must_use]
    pub fn fresh(today: chrono::NaiveDate, config: &ProgressionConfig) -> Self {
        Self {
            xp: 0,
            level: 1,
            completed_challenges: Vec::new(),
            unlocked_skills: Vec::new(),
            challenge_attempts: BTreeMap::new(),
            streak: StreakState::fresh(config.starting_freezes),
            daily_progress: DailyProgress::empty(today),
            achievements: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_completed(&self, challenge_id: &str) -> bool {
        self.completed_challenges.iter().any(|id| id == challenge_id)
    }

    #[must_use]
    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.unlocked_skills.iter().any(|id| id == skill_id)
    }

    #[must_use]
    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievements.iter().any(|id| id == achievement_id)
    }

    #[must_use]
    pub fn attempt(&self, challenge_id: &str) -> Option<&ChallengeAttempt> {
        self.challenge_attempts.get(challenge_id)
    }

    /// Completed challenges finished without revealing any hint.
    #[must_use]
    pub fn perfect_completions(&self) -> usize {
        self.challenge_attempts
            .values()
            .filter(|attempt| attempt.completed && attempt.hints_used.is_empty())
            .count()
    }

    #[must_use]
    pub fn level_progress(&self, config: &ProgressionConfig) -> LevelProgress {
        LevelProgress::compute(&config.xp_levels, self.xp)
    }

    /// Repair derived fields of a record that came from outside the engine.
    #[must_use]
    pub fn normalized(mut self, config: &ProgressionConfig) -> Self {
        self.level = level_for_xp_in(&config.xp_levels, self.xp);
        self.streak.longest = self.streak.longest.max(self.streak.current);
        dedup_in_place(&mut self.completed_challenges);
        dedup_in_place(&mut self.unlocked_skills);
        dedup_in_place(&mut self.achievements);
        self
    }

    pub(crate) fn with_skill(&self, skill_id: &str) -> Self {
        let mut next = self.clone();
        if !next.has_skill(skill_id) {
            next.unlocked_skills.push(skill_id.to_string());
        }
        next
    }

    pub(crate) fn with_achievement(&self, achievement_id: &str) -> Self {
        let mut next = self.clone();
        if !next.has_achievement(achievement_id) {
            next.achievements.push(achievement_id.to_string());
        }
        next
    }
}

fn dedup_in_place(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

/// Accept achievements stored either as bare ids or as `{ "id": ... }` objects.
fn achievement_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Id(String),
        Record { id: String },
    }

    let stored = Vec::<Stored>::deserialize(deserializer)?;
    Ok(stored
        .into_iter()
        .map(|entry| match entry {
            Stored::Id(id) | Stored::Record { id } => id,
        })
        .collect())
}

/// Apply one challenge completion atomically.
///
/// Adds XP and recomputes the level, counts the completion toward today's goal,
/// advances the streak on the completion path, updates the attempt history and
/// records the challenge as completed if it was not already. Repeat
/// submissions are rewarded again. The id is not checked against a catalog here.
#[must_use]
pub fn complete_challenge(
    record: &ProgressionRecord,
    challenge_id: &str,
    xp_earned: u32,
    hints_used: &[String],
    config: &ProgressionConfig,
    moment: Moment,
) -> ProgressionRecord {
    let mut next = record.clone();
    next.xp = record.xp.saturating_add(xp_earned);
    next.level = level_for_xp_in(&config.xp_levels, next.xp);
    next.daily_progress = record_completion(
        &record.daily_progress,
        moment.today,
        xp_earned,
        config.daily_goal,
    );
    next.streak = update_streak(&record.streak, moment.today);

    let attempt = next
        .challenge_attempts
        .entry(challenge_id.to_string())
        .or_insert_with(|| ChallengeAttempt::first(challenge_id));
    attempt.attempts = attempt.attempts.saturating_add(1);
    attempt.best_score = attempt.best_score.max(xp_earned);
    attempt.completed = true;
    attempt.last_attempt = moment.timestamp_ms;
    for hint in hints_used {
        if !attempt.hints_used.contains(hint) {
            attempt.hints_used.push(hint.clone());
        }
    }

    if !next.is_completed(challenge_id) {
        next.completed_challenges.push(challenge_id.to_string());
    }
    next
}

/// Session-start upkeep: streak freeze or reset, then daily rollover.
#[must_use]
pub fn run_maintenance(
    record: &ProgressionRecord,
    today: chrono::NaiveDate,
) -> (ProgressionRecord, StreakMaintenance) {
    let (streak, outcome) = maintain_streak(&record.streak, today);
    let next = ProgressionRecord {
        streak,
        daily_progress: roll_over(&record.daily_progress, today),
        ..record.clone()
    };
    (next, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn at(d: u32) -> Moment {
        Moment::new(day(d), i64::from(d) * 1_000)
    }

    #[test]
    fn fresh_record_defaults() {
        let record = ProgressionRecord::fresh(day(1), &ProgressionConfig::default());
        assert_eq!(record.xp, 0);
        assert_eq!(record.level, 1);
        assert_eq!(record.streak.freezes_available, 2);
        assert_eq!(record.daily_progress.date, day(1));
    }

    #[test]
    fn completion_merges_hints_and_tracks_best_score() {
        let cfg = ProgressionConfig::default();
        let record = ProgressionRecord::fresh(day(1), &cfg);
        let first = complete_challenge(&record, "c1", 40, &["h1".to_string()], &cfg, at(1));
        let second = complete_challenge(
            &first,
            "c1",
            90,
            &["h1".to_string(), "h2".to_string()],
            &cfg,
            at(2),
        );
        let attempt = second.attempt("c1").unwrap();
        assert_eq!(attempt.attempts, 2);
        assert_eq!(attempt.best_score, 90);
        assert_eq!(attempt.hints_used, vec!["h1".to_string(), "h2".to_string()]);
        assert_eq!(attempt.last_attempt, 2_000);
        assert_eq!(second.completed_challenges, vec!["c1".to_string()]);
        assert_eq!(second.xp, 130);
        assert_eq!(second.streak.current, 2);
    }

    #[test]
    fn completion_kind_detects_replay() {
        let cfg = ProgressionConfig::default();
        let record = ProgressionRecord::fresh(day(1), &cfg);
        assert_eq!(CompletionKind::for_record(&record, "c1"), CompletionKind::First);
        let done = complete_challenge(&record, "c1", 10, &[], &cfg, at(1));
        assert_eq!(CompletionKind::for_record(&done, "c1"), CompletionKind::Replay);
    }

    #[test]
    fn maintenance_rolls_daily_progress() {
        let cfg = ProgressionConfig::default();
        let record = complete_challenge(
            &ProgressionRecord::fresh(day(1), &cfg),
            "c1",
            10,
            &[],
            &cfg,
            at(1),
        );
        let (same_day, _) = run_maintenance(&record, day(1));
        assert_eq!(same_day.daily_progress.challenges_completed, 1);

        let (next_day, outcome) = run_maintenance(&record, day(2));
        assert_eq!(outcome, StreakMaintenance::Unchanged);
        assert_eq!(next_day.daily_progress, DailyProgress::empty(day(2)));
        assert_eq!(next_day.streak.current, 1);
    }

    #[test]
    fn normalization_repairs_derived_fields() {
        let cfg = ProgressionConfig::default();
        let mut record = ProgressionRecord::fresh(day(1), &cfg);
        record.xp = 900;
        record.level = 1;
        record.streak.current = 4;
        record.streak.longest = 2;
        record.completed_challenges = vec!["a".into(), "a".into(), "b".into()];
        let fixed = record.normalized(&cfg);
        assert_eq!(fixed.level, 5);
        assert_eq!(fixed.streak.longest, 4);
        assert_eq!(fixed.completed_challenges, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn achievements_load_from_ids_or_objects() {
        let cfg = ProgressionConfig::default();
        let mut json = serde_json::to_value(ProgressionRecord::fresh(day(1), &cfg)).unwrap();
        json["achievements"] = serde_json::json!([
            "first-fix",
            { "id": "streak-3", "name": "Warming Up", "unlockedAt": 5 }
        ]);
        let record: ProgressionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(
            record.achievements,
            vec!["first-fix".to_string(), "streak-3".to_string()]
        );
    }

    #[test]
    fn persisted_shape_uses_camel_case_keys() {
        let cfg = ProgressionConfig::default();
        let record = complete_challenge(
            &ProgressionRecord::fresh(day(1), &cfg),
            "c1",
            10,
            &[],
            &cfg,
            at(3),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("completedChallenges").is_some());
        assert!(json.get("dailyProgress").is_some());
        assert_eq!(json["streak"]["lastPracticeDate"], "2025-04-03");
        assert_eq!(json["challengeAttempts"]["c1"]["challengeId"], "c1");
        assert_eq!(json["dailyProgress"]["date"], "2025-04-03");
    }
}
