//! The stateful container the presentation layer talks to.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Challenge, Phase};
use crate::clock::{Clock, Moment};
use crate::error::GameError;
use crate::persistence::{KeyValueStore, ProgressionRepository};
use crate::progression::{
    DailyProgress, LevelProgress, ProgressionRecord, StreakState, roll_over,
};
use crate::reducer::reduce;
use crate::session::{GameEvent, GameRules, Notice, SessionState};
use crate::unlocks::{
    ChallengeStatus, RoomStatus, SkillStatus, available_challenges, calculate_phase,
    challenge_status, room_statuses, skill_statuses,
};

/// Today's progress toward the daily goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatus {
    pub progress: DailyProgress,
    pub goal: u32,
    pub remaining: u32,
}

/// Owns the session, applies events one at a time and persists progression.
pub struct GameStore<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    state: SessionState,
    rules: GameRules,
    repository: ProgressionRepository<S>,
    clock: C,
    last_notices: Vec<Notice>,
}

impl<S, C> GameStore<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Start a session from whatever is stored, then run streak maintenance.
    ///
    /// A missing or corrupt record falls back to a fresh one. The maintenance
    /// notices are available from [`GameStore::last_notices`].
    pub fn bootstrap(rules: GameRules, store: S, clock: C) -> Self {
        let repository = ProgressionRepository::new(store, rules.config.storage_key.clone());
        let today = clock.today();
        let fresh = ProgressionRecord::fresh(today, &rules.config);
        let mut this = Self {
            state: SessionState::new(fresh),
            rules,
            repository,
            clock,
            last_notices: Vec::new(),
        };

        if let Some(record) = this.repository.load() {
            log::debug!("restoring stored progression ({} xp)", record.xp);
            this.apply(GameEvent::LoadProgression {
                record: Box::new(record),
            });
        } else {
            log::info!("no stored progression; starting fresh");
        }
        this.apply(GameEvent::RunStreakMaintenance);
        this
    }

    /// Dispatch an event bootstrap generates itself; these cannot be rejected.
    fn apply(&mut self, event: GameEvent) {
        if let Err(err) = self.dispatch(event) {
            log::warn!("bootstrap event rejected: {err}");
        }
    }

    /// Apply one event. Progression changes are saved; a reset clears storage.
    ///
    /// # Errors
    ///
    /// Returns the reducer's [`GameError`]; the session is left unchanged.
    pub fn dispatch(&mut self, event: GameEvent) -> Result<&[Notice], GameError> {
        let name = event.name();
        let is_reset = matches!(event, GameEvent::ResetProgress);
        let moment = Moment::now(&self.clock);

        let transition = match reduce(&self.state, event, &self.rules, moment) {
            Ok(transition) => transition,
            Err(err) => {
                log::warn!("rejected {name}: {err}");
                return Err(err);
            }
        };
        log::debug!("applied {name} ({} notices)", transition.notices.len());

        let progression_changed = transition.state.progression != self.state.progression;
        self.state = transition.state;
        self.last_notices = transition.notices;

        if is_reset {
            self.repository.clear();
        } else if progression_changed {
            self.repository.save(&self.state.progression);
        }
        Ok(&self.last_notices)
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn progression(&self) -> &ProgressionRecord {
        &self.state.progression
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    #[must_use]
    pub fn repository(&self) -> &ProgressionRepository<S> {
        &self.repository
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Notices produced by the most recent successful dispatch.
    #[must_use]
    pub fn last_notices(&self) -> &[Notice] {
        &self.last_notices
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    #[must_use]
    pub fn level_progress(&self) -> LevelProgress {
        self.state.progression.level_progress(&self.rules.config)
    }

    #[must_use]
    pub fn streak(&self) -> &StreakState {
        &self.state.progression.streak
    }

    /// Daily status as of today; a stale record reads as zero progress.
    #[must_use]
    pub fn daily_status(&self) -> DailyStatus {
        let progress = roll_over(&self.state.progression.daily_progress, self.today());
        let goal = self.rules.config.daily_goal;
        DailyStatus {
            remaining: progress.remaining(goal),
            progress,
            goal,
        }
    }

    #[must_use]
    pub fn available_challenges(&self) -> Vec<&Challenge> {
        available_challenges(
            &self.rules.catalog,
            &self.state.progression.completed_challenges,
        )
    }

    #[must_use]
    pub fn room_statuses(&self) -> Vec<RoomStatus> {
        room_statuses(
            &self.rules.catalog,
            &self.state.progression.completed_challenges,
        )
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        calculate_phase(
            &self.rules.catalog,
            &self.state.progression.completed_challenges,
        )
    }

    #[must_use]
    pub fn skill_statuses(&self) -> Vec<SkillStatus> {
        skill_statuses(&self.rules.catalog, &self.state.progression)
    }

    /// # Errors
    ///
    /// Returns [`GameError::UnknownChallenge`] for ids missing from the catalog.
    pub fn challenge_status(&self, challenge_id: &str) -> Result<ChallengeStatus, GameError> {
        challenge_status(
            &self.rules.catalog,
            challenge_id,
            &self.state.progression.completed_challenges,
        )
    }
}
