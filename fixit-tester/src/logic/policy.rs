use std::fmt;

use fixit_game::Challenge;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// What a simulated player does with one challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub challenge_id: String,
    /// Hints revealed before answering.
    pub hints: Vec<String>,
    /// Answers submitted in order until one is accepted.
    pub answers: Vec<String>,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn straight(challenge: &Challenge, rationale: Option<String>) -> Self {
        Self {
            challenge_id: challenge.id.clone(),
            hints: Vec::new(),
            answers: vec![challenge.correct_answer.clone()],
            rationale,
        }
    }
}

/// What the player can see when choosing the next challenge.
#[derive(Debug, Clone, Copy)]
pub struct PlayerView<'a> {
    /// Unlocked challenges not completed yet, in catalog order.
    pub available: &'a [&'a Challenge],
    /// Challenges already completed, in catalog order.
    pub completed: &'a [&'a Challenge],
}

/// Policy interface for automated players.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next challenge to attempt, or `None` to stop for the day.
    fn pick(&mut self, view: PlayerView<'_>) -> Option<PolicyDecision>;
}

/// Built-in player strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerStrategy {
    /// Always answers correctly without hints.
    Perfectionist,
    /// Reveals every hint before answering correctly.
    HintSeeker,
    /// Tries the options in a random order.
    Guesser,
    /// Alternates new challenges with replays of completed ones.
    Replayer,
}

impl PlayerStrategy {
    pub const ALL: [Self; 4] = [
        Self::Perfectionist,
        Self::HintSeeker,
        Self::Guesser,
        Self::Replayer,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PlayerStrategy::Perfectionist => "Perfectionist",
            PlayerStrategy::HintSeeker => "Hint Seeker",
            PlayerStrategy::Guesser => "Guesser",
            PlayerStrategy::Replayer => "Replayer",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            PlayerStrategy::Perfectionist => Box::new(PerfectionistPolicy),
            PlayerStrategy::HintSeeker => Box::new(HintSeekerPolicy),
            PlayerStrategy::Guesser => Box::new(GuesserPolicy::new(seed)),
            PlayerStrategy::Replayer => Box::new(ReplayerPolicy::new(seed)),
        }
    }
}

impl fmt::Display for PlayerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct PerfectionistPolicy;
struct HintSeekerPolicy;

struct GuesserPolicy {
    rng: ChaCha20Rng,
}

impl GuesserPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

struct ReplayerPolicy {
    rng: ChaCha20Rng,
    replay_next: bool,
}

impl ReplayerPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            replay_next: false,
        }
    }
}

impl PlayerPolicy for PerfectionistPolicy {
    fn name(&self) -> &'static str {
        "Perfectionist"
    }

    fn pick(&mut self, view: PlayerView<'_>) -> Option<PolicyDecision> {
        let challenge = view.available.first()?;
        Some(PolicyDecision::straight(challenge, None))
    }
}

impl PlayerPolicy for HintSeekerPolicy {
    fn name(&self) -> &'static str {
        "Hint Seeker"
    }

    fn pick(&mut self, view: PlayerView<'_>) -> Option<PolicyDecision> {
        let challenge = view.available.first()?;
        let hints: Vec<String> = challenge.hints.iter().map(|h| h.id.clone()).collect();
        let rationale = Some(format!("{} hints", hints.len()));
        Some(PolicyDecision {
            hints,
            ..PolicyDecision::straight(challenge, rationale)
        })
    }
}

impl PlayerPolicy for GuesserPolicy {
    fn name(&self) -> &'static str {
        "Guesser"
    }

    fn pick(&mut self, view: PlayerView<'_>) -> Option<PolicyDecision> {
        let challenge = view.available.first()?;
        let mut answers = challenge.options.clone();
        answers.shuffle(&mut self.rng);
        if !answers.contains(&challenge.correct_answer) {
            answers.push(challenge.correct_answer.clone());
        }
        let guesses = answers
            .iter()
            .position(|answer| *answer == challenge.correct_answer)
            .map_or(answers.len(), |idx| idx + 1);
        Some(PolicyDecision {
            answers,
            ..PolicyDecision::straight(challenge, Some(format!("{guesses} guesses")))
        })
    }
}

impl PlayerPolicy for ReplayerPolicy {
    fn name(&self) -> &'static str {
        "Replayer"
    }

    fn pick(&mut self, view: PlayerView<'_>) -> Option<PolicyDecision> {
        let replay = self.replay_next && !view.completed.is_empty();
        self.replay_next = !self.replay_next;
        if replay || view.available.is_empty() {
            if view.completed.is_empty() {
                return None;
            }
            let idx = self.rng.gen_range(0..view.completed.len());
            let challenge = view.completed[idx];
            return Some(PolicyDecision::straight(
                challenge,
                Some("replay".to_string()),
            ));
        }
        let challenge = view.available.first()?;
        Some(PolicyDecision::straight(challenge, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixit_game::Catalog;

    fn first_two() -> Vec<&'static Challenge> {
        Catalog::default_catalog().challenges.iter().take(2).collect()
    }

    #[test]
    fn perfectionist_answers_first_available_correctly() {
        let challenges = first_two();
        let mut policy = PlayerStrategy::Perfectionist.create_policy(1);
        let decision = policy
            .pick(PlayerView {
                available: &challenges,
                completed: &[],
            })
            .unwrap();
        assert_eq!(decision.challenge_id, challenges[0].id);
        assert_eq!(decision.answers, vec![challenges[0].correct_answer.clone()]);
        assert!(decision.hints.is_empty());
    }

    #[test]
    fn hint_seeker_reveals_every_hint() {
        let challenges = first_two();
        let mut policy = PlayerStrategy::HintSeeker.create_policy(1);
        let decision = policy
            .pick(PlayerView {
                available: &challenges,
                completed: &[],
            })
            .unwrap();
        assert_eq!(decision.hints.len(), challenges[0].hints.len());
        assert!(!decision.hints.is_empty());
    }

    #[test]
    fn guesser_is_deterministic_and_eventually_correct() {
        let challenges = first_two();
        let view = PlayerView {
            available: &challenges,
            completed: &[],
        };
        let a = PlayerStrategy::Guesser.create_policy(7).pick(view).unwrap();
        let b = PlayerStrategy::Guesser.create_policy(7).pick(view).unwrap();
        assert_eq!(a, b);
        assert!(a.answers.contains(&challenges[0].correct_answer));
        assert_eq!(a.answers.len(), challenges[0].options.len());
    }

    #[test]
    fn replayer_alternates_with_completed_challenges() {
        let challenges = first_two();
        let (done, open) = challenges.split_at(1);
        let mut policy = PlayerStrategy::Replayer.create_policy(3);
        let view = PlayerView {
            available: open,
            completed: done,
        };
        let first = policy.pick(view).unwrap();
        let second = policy.pick(view).unwrap();
        assert_eq!(first.challenge_id, open[0].id);
        assert_eq!(second.challenge_id, done[0].id);
        assert_eq!(second.rationale.as_deref(), Some("replay"));
    }

    #[test]
    fn policies_stop_when_nothing_is_left() {
        for strategy in PlayerStrategy::ALL {
            let mut policy = strategy.create_policy(1);
            let view = PlayerView {
                available: &[],
                completed: &[],
            };
            assert!(policy.pick(view).is_none(), "{strategy}");
        }
    }
}
