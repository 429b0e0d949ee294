//! Fix-It Factory progression engine
//!
//! Platform-agnostic core for the Fix-It Factory learning game: the challenge
//! and skill catalog, XP/level/streak rules, room and phase unlocks,
//! achievements, best-effort persistence and the session reducer. No UI or
//! platform-specific dependencies.

pub mod achievements;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod game_store;
pub mod persistence;
pub mod progression;
pub mod reducer;
pub mod session;
pub mod unlocks;

// Re-export commonly used types
pub use achievements::{
    Achievement, AchievementCatalog, AchievementCategory, AchievementRule, unlock_achievement,
    unlock_earned_achievements,
};
pub use catalog::{Catalog, Challenge, ChallengeKind, Hint, Phase, Room, Skill};
pub use clock::{Clock, ManualClock, Moment, SystemClock};
pub use config::ProgressionConfig;
pub use error::{CatalogError, ConfigError, GameError};
pub use game_store::{DailyStatus, GameStore};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, ProgressionRepository, StoreError};
pub use progression::{
    ChallengeAttempt, CompletionKind, DailyProgress, LevelProgress, ProgressionRecord, SkillGap,
    StreakMaintenance, StreakState, complete_challenge, level_for_xp, level_for_xp_in,
    maintain_streak, record_completion, run_maintenance, try_unlock_skill, unlock_earned_skills,
    update_streak, use_streak_freeze,
};
pub use reducer::reduce;
pub use session::{
    ActiveLevel, GameEvent, GameRules, LogEntry, LogLevel, LogSource, Notice, SessionState,
    Transition,
};
pub use unlocks::{
    ChallengeStatus, RoomStatus, SkillStatus, available_challenges, calculate_phase,
    challenge_status, is_room_unlocked, room_statuses, skill_statuses, unlocked_room_count,
};
