//! Consecutive-day practice tracking with freeze forgiveness.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::{iso_date_or_empty, yesterday};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    /// `None` until the first completion; persisted as `""`.
    #[serde(with = "iso_date_or_empty")]
    pub last_practice_date: Option<NaiveDate>,
    pub freezes_available: u32,
    pub freezes_used: u32,
}

impl StreakState {
    #[must_use]
    pub const fn fresh(freezes: u32) -> Self {
        Self {
            current: 0,
            longest: 0,
            last_practice_date: None,
            freezes_available: freezes,
            freezes_used: 0,
        }
    }

    /// Whether the player has already been credited for `today`.
    #[must_use]
    pub fn practiced_on(&self, today: NaiveDate) -> bool {
        self.last_practice_date == Some(today)
    }

    fn is_lapsed(&self, today: NaiveDate) -> bool {
        self.last_practice_date
            .is_some_and(|last| last != today && Some(last) != yesterday(today))
    }
}

/// What the once-per-session maintenance check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMaintenance {
    Unchanged,
    /// A freeze was spent to keep the streak alive.
    Frozen,
    Reset,
}

/// Completion-path update, applied whenever a challenge is completed.
#[must_use]
pub fn update_streak(streak: &StreakState, today: NaiveDate) -> StreakState {
    if streak.practiced_on(today) {
        return streak.clone();
    }
    let continues = streak
        .last_practice_date
        .is_some_and(|last| Some(last) == yesterday(today));
    // First activity and lapsed streaks both start over at one.
    let current = if continues {
        streak.current.saturating_add(1)
    } else {
        1
    };
    StreakState {
        current,
        longest: streak.longest.max(current),
        last_practice_date: Some(today),
        ..streak.clone()
    }
}

/// Session-start check: spend a freeze on a lapsed streak, or reset it.
///
/// A spent freeze moves `last_practice_date` to yesterday so a completion today
/// continues the streak.
#[must_use]
pub fn maintain_streak(streak: &StreakState, today: NaiveDate) -> (StreakState, StreakMaintenance) {
    if !streak.is_lapsed(today) {
        return (streak.clone(), StreakMaintenance::Unchanged);
    }
    if streak.freezes_available > 0 && streak.current > 0 {
        let frozen = StreakState {
            freezes_available: streak.freezes_available - 1,
            freezes_used: streak.freezes_used.saturating_add(1),
            last_practice_date: yesterday(today).or(streak.last_practice_date),
            ..streak.clone()
        };
        return (frozen, StreakMaintenance::Frozen);
    }
    let outcome = if streak.current > 0 {
        StreakMaintenance::Reset
    } else {
        StreakMaintenance::Unchanged
    };
    (
        StreakState {
            current: 0,
            ..streak.clone()
        },
        outcome,
    )
}

/// Manually spend a freeze. No-op when none remain.
#[must_use]
pub fn use_streak_freeze(streak: &StreakState) -> StreakState {
    if streak.freezes_available == 0 {
        return streak.clone();
    }
    StreakState {
        freezes_available: streak.freezes_available - 1,
        freezes_used: streak.freezes_used.saturating_add(1),
        ..streak.clone()
    }
}
