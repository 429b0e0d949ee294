use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use fixit_game::{
    Challenge, Clock, CompletionKind, GameEvent, GameRules, GameStore, ManualClock, MemoryStore,
    Notice, Phase, ProgressionRecord, ProgressionRepository,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::logic::policy::{PlayerPolicy, PlayerStrategy, PlayerView, PolicyDecision};

/// First simulated day; every run starts from the same calendar date.
pub const SIMULATION_START: (i32, u32, u32) = (2025, 1, 6);

/// A scripted multi-day play session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: PlayerStrategy,
    pub days: u32,
    pub challenges_per_day: u32,
    /// Chance that the player stays away on any day after the first.
    pub skip_chance: f64,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: PlayerStrategy) -> Self {
        Self {
            strategy,
            days: 1,
            challenges_per_day: 3,
            skip_chance: 0.0,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub fn with_challenges_per_day(mut self, challenges: u32) -> Self {
        self.challenges_per_day = challenges;
        self
    }

    #[must_use]
    pub fn with_skip_chance(mut self, chance: f64) -> Self {
        self.skip_chance = chance.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn = Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One resolved challenge attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub day: u32,
    pub challenge_id: String,
    pub policy_name: String,
    pub hints_revealed: u32,
    pub wrong_answers: u32,
    /// XP awarded and whether it was a first completion; `None` if never accepted.
    pub outcome: Option<(u32, CompletionKind)>,
    pub rationale: Option<String>,
}

/// What happened on one simulated calendar day.
#[derive(Debug, Clone)]
pub struct DayOutcome {
    pub day: u32,
    pub date: NaiveDate,
    pub skipped: bool,
    pub attempts: Vec<AttemptRecord>,
    pub notices: Vec<Notice>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: PlayerStrategy,
    pub days: Vec<DayOutcome>,
    /// Events the engine rejected; a healthy run has none.
    pub errors: Vec<String>,
    pub final_record: ProgressionRecord,
    /// The record as read back from storage after the closing session.
    pub stored_record: Option<ProgressionRecord>,
    pub phase: Phase,
    pub rooms_unlocked: usize,
    pub rules: GameRules,
}

impl SimulationSummary {
    pub fn attempts(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.days.iter().flat_map(|day| day.attempts.iter())
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.days.iter().flat_map(|day| day.notices.iter())
    }

    #[must_use]
    pub fn days_played(&self) -> usize {
        self.days.iter().filter(|day| !day.skipped).count()
    }

    /// XP granted by every accepted answer.
    #[must_use]
    pub fn xp_awarded(&self) -> u32 {
        self.attempts()
            .filter_map(|attempt| attempt.outcome)
            .map(|(xp, _)| xp)
            .sum()
    }

    #[must_use]
    pub fn completions(&self, kind: CompletionKind) -> usize {
        self.attempts()
            .filter(|attempt| matches!(attempt.outcome, Some((_, k)) if k == kind))
            .count()
    }

    #[must_use]
    pub fn wrong_answers(&self) -> u32 {
        self.attempts().map(|attempt| attempt.wrong_answers).sum()
    }

    #[must_use]
    pub fn hints_revealed(&self) -> u32 {
        self.attempts().map(|attempt| attempt.hints_revealed).sum()
    }

    #[must_use]
    pub fn count_notices(&self, predicate: impl Fn(&Notice) -> bool) -> usize {
        self.notices().filter(|notice| predicate(notice)).count()
    }
}

/// Runs simulation plans against a fresh in-memory store.
#[derive(Debug, Clone)]
pub struct Simulator {
    rules: GameRules,
    verbose: bool,
}

impl Simulator {
    #[must_use]
    pub fn new(rules: GameRules, verbose: bool) -> Self {
        Self { rules, verbose }
    }

    /// Play `plan` day by day. Each played day is a new session bootstrapped
    /// from storage, so persistence and streak maintenance run between days.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let (year, month, day) = SIMULATION_START;
        let start = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default();
        let clock = ManualClock::starting_at(start);
        let memory = MemoryStore::new();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut policy = plan.strategy.create_policy(seed);
        let mut days = Vec::new();
        let mut errors = Vec::new();

        if self.verbose {
            println!(
                "🎮 Starting simulation | seed:{seed} policy:{} days:{}",
                plan.strategy.label(),
                plan.days
            );
        }

        for day in 1..=plan.days {
            if day > 1 {
                clock.advance_days(1);
            }
            if day > 1 && plan.skip_chance > 0.0 && rng.gen_bool(plan.skip_chance) {
                days.push(DayOutcome {
                    day,
                    date: clock.today(),
                    skipped: true,
                    attempts: Vec::new(),
                    notices: Vec::new(),
                });
                continue;
            }
            let outcome = self.play_day(plan, policy.as_mut(), day, &memory, &clock, &mut errors);
            if self.verbose {
                log_day(&outcome);
            }
            days.push(outcome);
        }

        let closing = GameStore::bootstrap(self.rules.clone(), memory.clone(), &clock);
        if let Some(last) = days.last_mut() {
            last.notices.extend_from_slice(closing.last_notices());
        }
        let stored_record =
            ProgressionRepository::new(memory, self.rules.config.storage_key.clone()).load();

        SimulationSummary {
            seed,
            strategy: plan.strategy,
            days,
            errors,
            final_record: closing.progression().clone(),
            stored_record,
            phase: closing.phase(),
            rooms_unlocked: closing.room_statuses().iter().filter(|s| s.unlocked).count(),
            rules: self.rules.clone(),
        }
    }

    fn play_day(
        &self,
        plan: &SimulationPlan,
        policy: &mut dyn PlayerPolicy,
        day: u32,
        memory: &MemoryStore,
        clock: &ManualClock,
        errors: &mut Vec<String>,
    ) -> DayOutcome {
        let mut store = GameStore::bootstrap(self.rules.clone(), memory.clone(), clock);
        let mut notices = store.last_notices().to_vec();
        let mut attempts = Vec::new();

        for _ in 0..plan.challenges_per_day {
            let Some(decision) = pick_next(&store, policy) else {
                break;
            };
            let record = attempt(&mut store, decision, policy.name(), day, &mut notices, errors);
            clock.tick_ms(60_000);
            attempts.push(record);
        }

        DayOutcome {
            day,
            date: clock.today(),
            skipped: false,
            attempts,
            notices,
        }
    }
}

type SimStore<'c> = GameStore<MemoryStore, &'c ManualClock>;

fn pick_next(store: &SimStore<'_>, policy: &mut dyn PlayerPolicy) -> Option<PolicyDecision> {
    let available = store.available_challenges();
    let progression = store.progression();
    let completed: Vec<&Challenge> = store
        .rules()
        .catalog
        .challenges
        .iter()
        .filter(|challenge| progression.is_completed(&challenge.id))
        .collect();
    policy.pick(PlayerView {
        available: &available,
        completed: &completed,
    })
}

fn attempt(
    store: &mut SimStore<'_>,
    decision: PolicyDecision,
    policy_name: &str,
    day: u32,
    notices: &mut Vec<Notice>,
    errors: &mut Vec<String>,
) -> AttemptRecord {
    let PolicyDecision {
        challenge_id,
        hints,
        answers,
        rationale,
    } = decision;
    let mut record = AttemptRecord {
        day,
        challenge_id: challenge_id.clone(),
        policy_name: policy_name.to_string(),
        hints_revealed: 0,
        wrong_answers: 0,
        outcome: None,
        rationale,
    };

    for hint_id in hints {
        let event = GameEvent::RevealHint {
            challenge_id: challenge_id.clone(),
            hint_id,
        };
        match store.dispatch(event) {
            Ok(emitted) => {
                record.hints_revealed += u32::try_from(
                    emitted
                        .iter()
                        .filter(|n| matches!(n, Notice::HintRevealed { .. }))
                        .count(),
                )
                .unwrap_or(0);
                notices.extend_from_slice(emitted);
            }
            Err(err) => errors.push(format!("day {day}: {err}")),
        }
    }

    for answer_id in answers {
        let event = GameEvent::SubmitAnswer {
            challenge_id: challenge_id.clone(),
            answer_id,
        };
        let emitted = match store.dispatch(event) {
            Ok(emitted) => emitted.to_vec(),
            Err(err) => {
                errors.push(format!("day {day}: {err}"));
                break;
            }
        };
        let accepted = emitted.iter().find_map(|notice| match notice {
            Notice::ChallengeCompleted {
                xp_earned, kind, ..
            } => Some((*xp_earned, *kind)),
            _ => None,
        });
        notices.extend(emitted);
        if accepted.is_some() {
            record.outcome = accepted;
            break;
        }
        record.wrong_answers += 1;
    }

    record
}

fn log_day(outcome: &DayOutcome) {
    let completed = outcome
        .attempts
        .iter()
        .filter(|attempt| attempt.outcome.is_some())
        .count();
    println!(
        "📅 Day {} ({}) | attempts:{} completed:{} notices:{}",
        outcome.day,
        outcome.date,
        outcome.attempts.len(),
        completed,
        outcome.notices.len()
    );
}
