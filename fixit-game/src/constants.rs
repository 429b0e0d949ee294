//! Centralized balance and tuning constants for Fix-It Factory progression.
//!
//! These values define the deterministic math for levels, streaks and daily
//! goals. Keeping them together ensures that pacing can only be adjusted via
//! code changes reviewed in version control; `ProgressionConfig` falls back to
//! these when a field is absent from a JSON override.

// Storage ------------------------------------------------------------------
/// Key under which the progression record is persisted.
pub const STORAGE_KEY: &str = "fix-it-factory-progression";

// Levels -------------------------------------------------------------------
/// Ascending XP thresholds; index `i` is the minimum XP for level `i + 1`.
pub const XP_LEVELS: [u32; 15] = [
    0, 100, 250, 500, 850, 1_300, 1_900, 2_650, 3_550, 4_600, 5_800, 7_200, 8_800, 10_600, 12_600,
];

// Daily goal and streaks ---------------------------------------------------
/// Challenges that must be completed in one day to meet the daily goal.
pub const DAILY_CHALLENGE_GOAL: u32 = 3;
/// Streak freezes granted to a fresh record. They never replenish.
pub const STARTING_STREAK_FREEZES: u32 = 2;

// Session ------------------------------------------------------------------
/// Maximum number of log entries retained by a session (newest first).
pub const LOG_CAPACITY: usize = 500;

// Log keys -----------------------------------------------------------------
pub(crate) const LOG_CHALLENGE_COMPLETED: &str = "log.challenge.completed";
pub(crate) const LOG_CHALLENGE_REPLAYED: &str = "log.challenge.replayed";
pub(crate) const LOG_ANSWER_REJECTED: &str = "log.challenge.answer-rejected";
pub(crate) const LOG_HINT_REVEALED: &str = "log.challenge.hint-revealed";
pub(crate) const LOG_LEVEL_UP: &str = "log.progression.level-up";
pub(crate) const LOG_DAILY_GOAL: &str = "log.progression.daily-goal";
pub(crate) const LOG_SKILL_UNLOCKED: &str = "log.skill.unlocked";
pub(crate) const LOG_ACHIEVEMENT_UNLOCKED: &str = "log.achievement.unlocked";
pub(crate) const LOG_STREAK_FROZEN: &str = "log.streak.frozen";
pub(crate) const LOG_STREAK_RESET: &str = "log.streak.reset";
pub(crate) const LOG_PROGRESS_RESET: &str = "log.progression.reset";
pub(crate) const LOG_PROGRESS_LOADED: &str = "log.progression.loaded";
