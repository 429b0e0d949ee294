//! Error types raised by the progression engine.
use thiserror::Error;

/// Reasons an event or lookup is rejected. A rejected event leaves state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("unknown challenge `{0}`")]
    UnknownChallenge(String),
    #[error("unknown skill `{0}`")]
    UnknownSkill(String),
    #[error("unknown achievement `{0}`")]
    UnknownAchievement(String),
    #[error("challenge `{challenge}` has no hint `{hint}`")]
    UnknownHint { challenge: String, hint: String },
    #[error("challenge `{challenge}` has no answer option `{answer}`")]
    UnknownAnswer { challenge: String, answer: String },
    #[error("challenge `{0}` is locked")]
    ChallengeLocked(String),
    #[error(
        "skill `{skill}` is locked (missing challenges: [{}], missing skills: [{}])",
        .missing_challenges.join(", "),
        .missing_skills.join(", ")
    )]
    SkillLocked {
        skill: String,
        missing_challenges: Vec<String>,
        missing_skills: Vec<String>,
    },
}

/// Structural problems found while validating a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("challenge `{id}` has difficulty {difficulty}, expected 1-5")]
    DifficultyOutOfRange { id: String, difficulty: u8 },
    #[error("challenge `{0}` awards no XP")]
    ZeroReward(String),
    #[error("challenge `{id}` answer `{answer}` is not one of its options")]
    AnswerNotAnOption { id: String, answer: String },
    #[error("challenge `{challenge}` repeats hint `{hint}`")]
    DuplicateHint { challenge: String, hint: String },
    #[error("{owner} references missing {kind} `{id}`")]
    DanglingReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
    #[error("{kind} prerequisites form a cycle through `{id}`")]
    PrerequisiteCycle { kind: &'static str, id: String },
}

/// Problems with a progression configuration override.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("xp level table is empty")]
    EmptyLevelTable,
    #[error("xp level table must start at 0, found {0}")]
    LevelTableStart(u32),
    #[error("xp level table is not strictly ascending at index {0}")]
    LevelTableOrder(usize),
    #[error("daily goal must be at least 1")]
    ZeroDailyGoal,
    #[error("log capacity must be at least 1")]
    ZeroLogCapacity,
    #[error("storage key must not be empty")]
    EmptyStorageKey,
}
