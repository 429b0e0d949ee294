//! Tunable progression settings with defaults taken from [`crate::constants`].
use serde::{Deserialize, Serialize};

use crate::constants::{
    DAILY_CHALLENGE_GOAL, LOG_CAPACITY, STARTING_STREAK_FREEZES, STORAGE_KEY, XP_LEVELS,
};
use crate::error::ConfigError;

/// Balance knobs for the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub xp_levels: Vec<u32>,
    pub daily_goal: u32,
    pub starting_freezes: u32,
    pub log_capacity: usize,
    pub storage_key: String,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_levels: XP_LEVELS.to_vec(),
            daily_goal: DAILY_CHALLENGE_GOAL,
            starting_freezes: STARTING_STREAK_FREEZES,
            log_capacity: LOG_CAPACITY,
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

impl ProgressionConfig {
    /// Parse a (possibly partial) JSON override. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let first = *self.xp_levels.first().ok_or(ConfigError::EmptyLevelTable)?;
        if first != 0 {
            return Err(ConfigError::LevelTableStart(first));
        }
        if let Some(idx) = self
            .xp_levels
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(ConfigError::LevelTableOrder(idx + 1));
        }
        if self.daily_goal == 0 {
            return Err(ConfigError::ZeroDailyGoal);
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }

    /// Highest level reachable with this level table.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.xp_levels.len()).unwrap_or(u32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ProgressionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.daily_goal, 3);
        assert_eq!(cfg.starting_freezes, 2);
        assert_eq!(cfg.max_level(), 15);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg = ProgressionConfig::from_json(r#"{"daily_goal": 5}"#).unwrap();
        assert_eq!(cfg.daily_goal, 5);
        assert_eq!(cfg.xp_levels, XP_LEVELS.to_vec());
        assert_eq!(cfg.storage_key, STORAGE_KEY);
    }

    #[test]
    fn rejects_bad_level_tables() {
        let mut cfg = ProgressionConfig {
            xp_levels: Vec::new(),
            ..ProgressionConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyLevelTable));

        cfg.xp_levels = vec![10, 20];
        assert_eq!(cfg.validate(), Err(ConfigError::LevelTableStart(10)));

        cfg.xp_levels = vec![0, 100, 100, 300];
        assert_eq!(cfg.validate(), Err(ConfigError::LevelTableOrder(2)));
    }

    #[test]
    fn rejects_zero_goal_capacity_and_blank_key() {
        let base = ProgressionConfig::default();
        let zero_goal = ProgressionConfig {
            daily_goal: 0,
            ..base.clone()
        };
        assert_eq!(zero_goal.validate(), Err(ConfigError::ZeroDailyGoal));

        let zero_logs = ProgressionConfig {
            log_capacity: 0,
            ..base.clone()
        };
        assert_eq!(zero_logs.validate(), Err(ConfigError::ZeroLogCapacity));

        let blank = ProgressionConfig {
            storage_key: "  ".into(),
            ..base
        };
        assert_eq!(blank.validate(), Err(ConfigError::EmptyStorageKey));
    }
}
