//! Per-day completion counters and the daily goal.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub challenges_completed: u32,
    pub xp_earned: u32,
    pub goal_met: bool,
}

impl DailyProgress {
    /// Empty counters for `date`.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            challenges_completed: 0,
            xp_earned: 0,
            goal_met: false,
        }
    }

    /// Challenges still needed today to meet `goal`.
    #[must_use]
    pub const fn remaining(&self, goal: u32) -> u32 {
        goal.saturating_sub(self.challenges_completed)
    }
}

/// Count one completion worth `xp_earned` toward `today`.
#[must_use]
pub fn record_completion(
    daily: &DailyProgress,
    today: NaiveDate,
    xp_earned: u32,
    goal: u32,
) -> DailyProgress {
    let base = if daily.date == today {
        daily.clone()
    } else {
        DailyProgress::empty(today)
    };
    let challenges_completed = base.challenges_completed.saturating_add(1);
    DailyProgress {
        challenges_completed,
        xp_earned: base.xp_earned.saturating_add(xp_earned),
        goal_met: challenges_completed >= goal,
        ..base
    }
}

/// Start a zeroed record when the calendar has moved on.
#[must_use]
pub fn roll_over(daily: &DailyProgress, today: NaiveDate) -> DailyProgress {
    if daily.date == today {
        daily.clone()
    } else {
        DailyProgress::empty(today)
    }
}
