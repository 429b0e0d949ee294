use std::collections::HashSet;

use anyhow::{Result, ensure};
use fixit_game::{CompletionKind, Notice, Phase, Room};

use super::TestScenario;
use crate::logic::{PlayerStrategy, SimulationPlan, SimulationSummary};

const CAMPAIGN_DAYS: u32 = 12;
const CAMPAIGN_PER_DAY: u32 = 5;
const DAILY_GOAL_DAYS: u32 = 5;
const DAILY_GOAL_PER_DAY: u32 = 3;

pub fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(PlayerStrategy::Perfectionist)
            .with_expectation(no_rejections)
            .with_expectation(smoke_expectation)
            .with_expectation(xp_matches_awards)
            .with_expectation(storage_matches_session),
    )
}

pub fn full_campaign_scenario() -> TestScenario {
    TestScenario::simulation(
        "Full Campaign - Perfectionist",
        SimulationPlan::new(PlayerStrategy::Perfectionist)
            .with_days(CAMPAIGN_DAYS)
            .with_challenges_per_day(CAMPAIGN_PER_DAY)
            .with_expectation(full_campaign_expectation)
            .with_expectation(level_matches_xp)
            .with_expectation(streak_invariants),
    )
}

pub fn streak_freeze_scenario() -> TestScenario {
    TestScenario::simulation(
        "Streak Freezes Over Irregular Play",
        SimulationPlan::new(PlayerStrategy::Perfectionist)
            .with_days(21)
            .with_challenges_per_day(2)
            .with_skip_chance(0.3)
            .with_expectation(streak_invariants)
            .with_expectation(freeze_notices_expectation),
    )
}

pub fn daily_goal_scenario() -> TestScenario {
    TestScenario::simulation(
        "Daily Goal Every Day",
        SimulationPlan::new(PlayerStrategy::Perfectionist)
            .with_days(DAILY_GOAL_DAYS)
            .with_challenges_per_day(DAILY_GOAL_PER_DAY)
            .with_expectation(daily_goal_expectation)
            .with_expectation(streak_invariants),
    )
}

pub fn replay_rewards_scenario() -> TestScenario {
    TestScenario::simulation(
        "Replays Earn XP Again",
        SimulationPlan::new(PlayerStrategy::Replayer)
            .with_days(4)
            .with_challenges_per_day(4)
            .with_expectation(no_rejections)
            .with_expectation(replay_expectation)
            .with_expectation(xp_matches_awards),
    )
}

pub fn hint_penalties_scenario() -> TestScenario {
    TestScenario::simulation(
        "Hint Penalties Reduce Rewards",
        SimulationPlan::new(PlayerStrategy::HintSeeker)
            .with_days(3)
            .with_challenges_per_day(3)
            .with_expectation(hint_penalty_expectation)
            .with_expectation(xp_matches_awards),
    )
}

pub fn wrong_answers_scenario() -> TestScenario {
    TestScenario::simulation(
        "Wrong Answers Cost Nothing",
        SimulationPlan::new(PlayerStrategy::Guesser)
            .with_days(3)
            .with_challenges_per_day(3)
            .with_expectation(wrong_answers_expectation)
            .with_expectation(xp_matches_awards),
    )
}

pub fn persistence_reload_scenario() -> TestScenario {
    TestScenario::simulation(
        "Progress Survives Reloads",
        SimulationPlan::new(PlayerStrategy::Perfectionist)
            .with_days(4)
            .with_challenges_per_day(2)
            .with_expectation(storage_matches_session)
            .with_expectation(persistence_expectation),
    )
}

fn no_rejections(summary: &SimulationSummary) -> Result<()> {
    let unsolved = summary
        .attempts()
        .filter(|attempt| attempt.outcome.is_none())
        .count();
    ensure!(unsolved == 0, "{unsolved} attempts were never accepted");
    Ok(())
}

fn xp_matches_awards(summary: &SimulationSummary) -> Result<()> {
    let awarded = summary.xp_awarded();
    ensure!(
        summary.final_record.xp == awarded,
        "Record holds {} XP but {awarded} XP was awarded",
        summary.final_record.xp
    );
    Ok(())
}

fn level_matches_xp(summary: &SimulationSummary) -> Result<()> {
    let record = &summary.final_record;
    let expected = record.level_progress(&summary.rules.config).level;
    ensure!(
        record.level == expected,
        "Level {} does not match {} XP (expected {expected})",
        record.level,
        record.xp
    );
    Ok(())
}

fn storage_matches_session(summary: &SimulationSummary) -> Result<()> {
    let stored = summary
        .stored_record
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No progression record in storage"))?;
    ensure!(
        *stored == summary.final_record,
        "Stored record diverged from session: stored {} XP, session {} XP",
        stored.xp,
        summary.final_record.xp
    );
    Ok(())
}

fn streak_invariants(summary: &SimulationSummary) -> Result<()> {
    let streak = &summary.final_record.streak;
    let starting = summary.rules.config.starting_freezes;
    ensure!(
        streak.longest >= streak.current,
        "Longest streak {} below current {}",
        streak.longest,
        streak.current
    );
    ensure!(
        streak.freezes_available + streak.freezes_used == starting,
        "Freezes do not add up: {} available + {} used != {starting}",
        streak.freezes_available,
        streak.freezes_used
    );
    let played = u32::try_from(summary.days_played()).unwrap_or(u32::MAX);
    ensure!(
        streak.longest <= played,
        "Longest streak {} exceeds {played} days played",
        streak.longest
    );
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = &summary.final_record;
    ensure!(
        summary.completions(CompletionKind::First) == 3,
        "Expected 3 first-time completions, observed {}",
        summary.completions(CompletionKind::First)
    );
    ensure!(record.xp > 0, "No XP earned");
    ensure!(record.streak.current == 1, "Streak should start at 1");
    ensure!(
        record.has_achievement("first-fix"),
        "First completion should award first-fix"
    );
    Ok(())
}

fn full_campaign_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = &summary.final_record;
    let catalog = &summary.rules.catalog;
    ensure!(
        record.completed_challenges.len() == catalog.challenges.len(),
        "Completed {}/{} challenges",
        record.completed_challenges.len(),
        catalog.challenges.len()
    );
    ensure!(
        record.xp == catalog.total_reward(&record.completed_challenges),
        "Perfect play should earn every listed reward exactly once"
    );
    ensure!(
        record.unlocked_skills.len() == catalog.skills.len(),
        "Unlocked {}/{} skills",
        record.unlocked_skills.len(),
        catalog.skills.len()
    );
    ensure!(
        summary.phase == Phase::Architect,
        "Campaign ended in phase {}",
        summary.phase
    );
    ensure!(
        summary.rooms_unlocked == Room::ALL.len(),
        "Only {} rooms unlocked",
        summary.rooms_unlocked
    );
    ensure!(
        record.has_achievement("architect-phase"),
        "Reaching the final phase should award architect-phase"
    );
    Ok(())
}

fn freeze_notices_expectation(summary: &SimulationSummary) -> Result<()> {
    let starting = summary.rules.config.starting_freezes;
    for notice in summary.notices() {
        match notice {
            Notice::StreakFrozen { freezes_left, .. } => {
                ensure!(
                    *freezes_left < starting,
                    "Freeze notice reports {freezes_left} freezes left"
                );
            }
            Notice::StreakReset { lost } => {
                ensure!(*lost > 0, "Reset notice for an empty streak");
            }
            _ => {}
        }
    }
    let frozen = summary.count_notices(|n| matches!(n, Notice::StreakFrozen { .. }));
    let used = summary.final_record.streak.freezes_used;
    ensure!(
        u32::try_from(frozen).unwrap_or(u32::MAX) <= used,
        "{frozen} freeze notices but only {used} freezes used"
    );
    Ok(())
}

fn daily_goal_expectation(summary: &SimulationSummary) -> Result<()> {
    let goal = summary.rules.config.daily_goal;
    let met = summary.count_notices(|n| matches!(n, Notice::DailyGoalMet { .. }));
    let record = &summary.final_record;
    if goal <= DAILY_GOAL_PER_DAY {
        ensure!(
            met == summary.days_played(),
            "Daily goal met on {met} of {} days",
            summary.days_played()
        );
        ensure!(
            record.has_achievement("daily-goal"),
            "Meeting the goal should award daily-goal"
        );
    } else {
        ensure!(met == 0, "Goal of {goal} cannot be met with {DAILY_GOAL_PER_DAY} per day");
    }
    ensure!(
        record.streak.current == DAILY_GOAL_DAYS,
        "Expected a {DAILY_GOAL_DAYS}-day streak, observed {}",
        record.streak.current
    );
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let replays = summary.completions(CompletionKind::Replay);
    let record = &summary.final_record;
    ensure!(replays > 0, "Replayer never replayed a challenge");
    ensure!(
        record.xp > summary.rules.catalog.total_reward(&record.completed_challenges),
        "Replays should earn XP beyond first-time rewards"
    );
    let unique: HashSet<&String> = record.completed_challenges.iter().collect();
    ensure!(
        unique.len() == record.completed_challenges.len(),
        "Completed challenges contain duplicates"
    );
    let repeated = record.challenge_attempts.values().any(|a| a.attempts > 1);
    ensure!(repeated, "No challenge records more than one attempt");
    Ok(())
}

fn hint_penalty_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = &summary.final_record;
    let full = summary.rules.catalog.total_reward(&record.completed_challenges);
    let penalties: u32 = summary
        .notices()
        .filter_map(|notice| match notice {
            Notice::HintRevealed { xp_cost, .. } => Some(*xp_cost),
            _ => None,
        })
        .sum();
    ensure!(summary.hints_revealed() > 0, "No hints were revealed");
    ensure!(
        record.xp == full.saturating_sub(penalties),
        "XP {} should equal rewards {full} minus hint costs {penalties}",
        record.xp
    );
    ensure!(
        record.perfect_completions() == 0,
        "Hinted completions must not count as perfect"
    );
    Ok(())
}

fn wrong_answers_expectation(summary: &SimulationSummary) -> Result<()> {
    no_rejections(summary)?;
    let rejected = summary.count_notices(|n| matches!(n, Notice::AnswerRejected { .. }));
    ensure!(
        u32::try_from(rejected).unwrap_or(u32::MAX) == summary.wrong_answers(),
        "{rejected} rejection notices for {} wrong answers",
        summary.wrong_answers()
    );
    let record = &summary.final_record;
    ensure!(
        record.xp == summary.rules.catalog.total_reward(&record.completed_challenges),
        "Wrong answers should not reduce rewards"
    );
    ensure!(
        record.challenge_attempts.values().all(|a| a.attempts == 1),
        "Rejected answers should not count as attempts"
    );
    Ok(())
}

fn persistence_expectation(summary: &SimulationSummary) -> Result<()> {
    let record = &summary.final_record;
    let first = summary.completions(CompletionKind::First);
    ensure!(
        record.completed_challenges.len() == first,
        "{} challenges stored after {first} completions across sessions",
        record.completed_challenges.len()
    );
    ensure!(
        summary.days_played() > 1,
        "Persistence needs more than one session"
    );
    xp_matches_awards(summary)
}
