//! XP to level math.
use serde::{Deserialize, Serialize};

use crate::constants::XP_LEVELS;

/// Level for `xp` using the default threshold table.
#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    level_for_xp_in(&XP_LEVELS, xp)
}

/// Level for `xp` given an ascending threshold table starting at zero.
///
/// Returns `1 + max{i : table[i] <= xp}`, clamped to the table length. An empty
/// table is treated as a single level.
#[must_use]
pub fn level_for_xp_in(table: &[u32], xp: u32) -> u32 {
    let reached = table.iter().take_while(|&&threshold| threshold <= xp).count();
    u32::try_from(reached.max(1)).unwrap_or(u32::MAX)
}

/// Snapshot of how far a player is through their current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u32,
    pub current_threshold: u32,
    /// `None` once the top of the table is reached.
    pub next_threshold: Option<u32>,
    pub xp_into_level: u32,
    pub xp_to_next: u32,
    /// Whole percent through the level, 100 at max level.
    pub percent: u8,
}

impl LevelProgress {
    #[must_use]
    pub fn compute(table: &[u32], xp: u32) -> Self {
        let level = level_for_xp_in(table, xp);
        let idx = usize::try_from(level - 1).unwrap_or(usize::MAX);
        let current_threshold = table.get(idx).copied().unwrap_or(0);
        let next_threshold = table.get(idx.saturating_add(1)).copied();
        let xp_into_level = xp.saturating_sub(current_threshold);

        let (xp_to_next, percent) = match next_threshold {
            Some(next) => {
                let span = next.saturating_sub(current_threshold).max(1);
                let pct = u64::from(xp_into_level) * 100 / u64::from(span);
                (
                    next.saturating_sub(xp),
                    u8::try_from(pct.min(100)).unwrap_or(100),
                )
            }
            None => (0, 100),
        };

        Self {
            level,
            xp,
            current_threshold,
            next_threshold,
            xp_into_level,
            xp_to_next,
            percent,
        }
    }

    #[must_use]
    pub const fn is_max_level(&self) -> bool {
        self.next_threshold.is_none()
    }
}
