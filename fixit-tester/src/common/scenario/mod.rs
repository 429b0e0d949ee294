use crate::logic::SimulationPlan;

pub mod catalog;

use catalog::{
    daily_goal_scenario, full_campaign_scenario, hint_penalties_scenario,
    persistence_reload_scenario, replay_rewards_scenario, smoke_scenario, streak_freeze_scenario,
    wrong_answers_scenario,
};

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "full-campaign" | "campaign" => Some(full_campaign_scenario()),
        "streak-freeze" | "streaks" => Some(streak_freeze_scenario()),
        "daily-goal" | "daily" => Some(daily_goal_scenario()),
        "replay-rewards" | "replay" => Some(replay_rewards_scenario()),
        "hint-penalties" | "hints" => Some(hint_penalties_scenario()),
        "wrong-answers" | "guessing" => Some(wrong_answers_scenario()),
        "persistence-reload" | "persistence" => Some(persistence_reload_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("full-campaign", "Full Campaign - Perfectionist"),
        ("streak-freeze", "Streak Freezes Over Irregular Play"),
        ("daily-goal", "Daily Goal Every Day"),
        ("replay-rewards", "Replays Earn XP Again"),
        ("hint-penalties", "Hint Penalties Reduce Rewards"),
        ("wrong-answers", "Wrong Answers Cost Nothing"),
        ("persistence-reload", "Progress Survives Reloads"),
    ]
}
