//! Session state, dispatched events and the notices a transition emits.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::achievements::AchievementCatalog;
use crate::catalog::{Catalog, Room};
use crate::config::ProgressionConfig;
use crate::progression::{CompletionKind, ProgressionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
    Debug,
}

/// Where a log entry came from: a room, or the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(into = "String", try_from = "String")]
pub enum LogSource {
    #[default]
    System,
    Room(Room),
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Room(room) => fmt::Display::fmt(room, f),
        }
    }
}

impl From<LogSource> for String {
    fn from(source: LogSource) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for LogSource {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw == "system" {
            return Ok(Self::System);
        }
        Room::ALL
            .iter()
            .find(|room| room.key() == raw)
            .map(|&room| Self::Room(room))
            .ok_or_else(|| format!("unknown log source `{raw}`"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic within a session.
    pub id: u64,
    pub timestamp_ms: i64,
    pub level: LogLevel,
    pub source: LogSource,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A generic level the presentation layer has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLevel {
    pub id: String,
    pub room: Room,
    pub started_at_ms: i64,
}

/// Everything a running session holds. Only `progression` outlives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_room: Room,
    pub current_level: Option<ActiveLevel>,
    pub completed_levels: Vec<String>,
    pub score: u64,
    /// Newest first, capped at the configured capacity.
    pub logs: Vec<LogEntry>,
    pub next_log_id: u64,
    /// Opaque per-room simulation state, shallow-merged on update.
    pub room_states: BTreeMap<Room, serde_json::Value>,
    /// Hints revealed this session, per challenge, not yet spent on a completion.
    pub revealed_hints: BTreeMap<String, Vec<String>>,
    pub progression: ProgressionRecord,
}

impl SessionState {
    #[must_use]
    pub fn new(progression: ProgressionRecord) -> Self {
        Self {
            current_room: Room::Tutorial,
            current_level: None,
            completed_levels: Vec::new(),
            score: 0,
            logs: Vec::new(),
            next_log_id: 1,
            room_states: BTreeMap::new(),
            revealed_hints: BTreeMap::new(),
            progression,
        }
    }

    #[must_use]
    pub fn revealed_for(&self, challenge_id: &str) -> &[String] {
        self.revealed_hints
            .get(challenge_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn room_state(&self, room: Room) -> Option<&serde_json::Value> {
        self.room_states.get(&room)
    }

    pub(crate) fn push_log(
        &mut self,
        capacity: usize,
        timestamp_ms: i64,
        level: LogLevel,
        source: LogSource,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let entry = LogEntry {
            id: self.next_log_id,
            timestamp_ms,
            level,
            source,
            message: message.into(),
            details,
        };
        self.next_log_id = self.next_log_id.saturating_add(1);
        self.logs.insert(0, entry);
        self.logs.truncate(capacity.max(1));
    }

    /// Shallow merge: object patches overlay existing keys, anything else replaces.
    pub(crate) fn merge_room_state(&mut self, room: Room, patch: serde_json::Value) {
        if let (Some(serde_json::Value::Object(existing)), serde_json::Value::Object(fields)) =
            (self.room_states.get_mut(&room), &patch)
        {
            existing.extend(fields.clone());
            return;
        }
        self.room_states.insert(room, patch);
    }
}

/// Static rules a session runs under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameRules {
    pub catalog: Catalog,
    pub achievements: AchievementCatalog,
    pub config: ProgressionConfig,
}

impl GameRules {
    /// Bundled catalog and achievements with the given configuration.
    #[must_use]
    pub fn bundled(config: ProgressionConfig) -> Self {
        Self {
            catalog: Catalog::default_catalog().clone(),
            achievements: AchievementCatalog::default_catalog().clone(),
            config,
        }
    }
}

/// A typed request to change session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    SetRoom {
        room: Room,
    },
    StartLevel {
        level_id: String,
        room: Room,
    },
    CompleteLevel {
        level_id: String,
        score: u64,
    },
    AddLog {
        #[serde(default)]
        level: LogLevel,
        #[serde(default)]
        source: LogSource,
        message: String,
        #[serde(default)]
        details: Option<serde_json::Value>,
    },
    UpdateRoomState {
        room: Room,
        patch: serde_json::Value,
    },
    RevealHint {
        challenge_id: String,
        hint_id: String,
    },
    SubmitAnswer {
        challenge_id: String,
        answer_id: String,
    },
    CompleteChallenge {
        challenge_id: String,
        xp_earned: u32,
        #[serde(default)]
        hints_used: Vec<String>,
    },
    UnlockSkill {
        skill_id: String,
    },
    RunStreakMaintenance,
    UseStreakFreeze,
    UnlockAchievement {
        achievement_id: String,
    },
    ResetProgress,
    LoadProgression {
        record: Box<ProgressionRecord>,
    },
}

impl GameEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetRoom { .. } => "set_room",
            Self::StartLevel { .. } => "start_level",
            Self::CompleteLevel { .. } => "complete_level",
            Self::AddLog { .. } => "add_log",
            Self::UpdateRoomState { .. } => "update_room_state",
            Self::RevealHint { .. } => "reveal_hint",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::CompleteChallenge { .. } => "complete_challenge",
            Self::UnlockSkill { .. } => "unlock_skill",
            Self::RunStreakMaintenance => "run_streak_maintenance",
            Self::UseStreakFreeze => "use_streak_freeze",
            Self::UnlockAchievement { .. } => "unlock_achievement",
            Self::ResetProgress => "reset_progress",
            Self::LoadProgression { .. } => "load_progression",
        }
    }
}

/// Something noteworthy that happened while applying an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    ChallengeCompleted {
        challenge_id: String,
        xp_earned: u32,
        kind: CompletionKind,
    },
    AnswerRejected {
        challenge_id: String,
        answer_id: String,
    },
    HintRevealed {
        challenge_id: String,
        hint_id: String,
        xp_cost: u32,
    },
    LevelUp {
        from: u32,
        to: u32,
    },
    DailyGoalMet {
        completed: u32,
    },
    StreakFrozen {
        current: u32,
        freezes_left: u32,
    },
    StreakReset {
        lost: u32,
    },
    SkillUnlocked {
        skill_id: String,
    },
    AchievementUnlocked {
        achievement_id: String,
    },
    ProgressReset,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub notices: Vec<Notice>,
}
