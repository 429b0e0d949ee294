//! Static challenge and skill definitions.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{CatalogError, GameError};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/data/catalog.json");

/// Thematic groupings of challenges, listed in unlock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Room {
    Tutorial,
    Upload,
    Clean,
    Store,
    Brain,
    Screens,
}

impl Room {
    /// Rooms in the order they unlock (the data flow of the simulated app).
    pub const ALL: [Self; 6] = [
        Self::Tutorial,
        Self::Upload,
        Self::Clean,
        Self::Store,
        Self::Brain,
        Self::Screens,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Tutorial => "tutorial",
            Self::Upload => "upload",
            Self::Clean => "clean",
            Self::Store => "store",
            Self::Brain => "brain",
            Self::Screens => "screens",
        }
    }

    /// Position of the room in the unlock order.
    #[must_use]
    pub const fn unlock_index(self) -> usize {
        self as usize
    }

    /// The room unlocked immediately before this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.unlock_index()
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx).copied())
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Global maturity tier gating challenge availability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Operator,
    Engineer,
    Architect,
}

impl Phase {
    pub const ALL: [Self; 3] = [Self::Operator, Self::Engineer, Self::Architect];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Engineer => "engineer",
            Self::Architect => "architect",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What the player is asked to do in a challenge's simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    #[default]
    Observe,
    Diagnose,
    Fix,
    Design,
}

/// A hint that can be revealed for an XP penalty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub id: String,
    pub xp_cost: u32,
}

/// A single scenario-based multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub room: Room,
    pub phase: Phase,
    #[serde(default)]
    pub title: String,
    pub difficulty: u8,
    pub xp_reward: u32,
    #[serde(default)]
    pub kind: ChallengeKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub skills_taught: Vec<String>,
}

impl Challenge {
    #[must_use]
    pub fn hint(&self, hint_id: &str) -> Option<&Hint> {
        self.hints.iter().find(|hint| hint.id == hint_id)
    }

    #[must_use]
    pub fn has_option(&self, answer_id: &str) -> bool {
        self.options.iter().any(|option| option == answer_id)
    }

    /// Total XP penalty for the given revealed hints. Unknown hint ids cost nothing.
    #[must_use]
    pub fn hint_penalty<'a, I>(&self, revealed: I) -> u32
    where
        I: IntoIterator<Item = &'a String>,
    {
        revealed
            .into_iter()
            .filter_map(|id| self.hint(id))
            .fold(0_u32, |acc, hint| acc.saturating_add(hint.xp_cost))
    }

    /// XP earned for a correct answer after hint penalties, floored at zero.
    #[must_use]
    pub fn reward_after_hints<'a, I>(&self, revealed: I) -> u32
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.xp_reward.saturating_sub(self.hint_penalty(revealed))
    }
}

/// A mastery badge earned by completing a set of challenges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub room: Room,
    pub phase: Phase,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub challenges_required: Vec<String>,
}

impl Skill {
    /// Whether every required challenge appears in `completed`.
    #[must_use]
    pub fn requirements_met(&self, completed: &[String]) -> bool {
        self.challenges_required
            .iter()
            .all(|id| completed.contains(id))
    }
}

/// Immutable container for every challenge and skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl Catalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_CATALOG_DATA).unwrap_or_default()
    }

    /// Shared catalog parsed from the bundled asset.
    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a challenge by id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownChallenge`] if no challenge has this id.
    pub fn challenge(&self, id: &str) -> Result<&Challenge, GameError> {
        self.challenges
            .iter()
            .find(|challenge| challenge.id == id)
            .ok_or_else(|| GameError::UnknownChallenge(id.to_string()))
    }

    /// Look up a skill by id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownSkill`] if no skill has this id.
    pub fn skill(&self, id: &str) -> Result<&Skill, GameError> {
        self.skills
            .iter()
            .find(|skill| skill.id == id)
            .ok_or_else(|| GameError::UnknownSkill(id.to_string()))
    }

    pub fn challenges_in_room(&self, room: Room) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(move |c| c.room == room)
    }

    pub fn challenges_in_phase(&self, phase: Phase) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(move |c| c.phase == phase)
    }

    pub fn skills_in_room(&self, room: Room) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(move |s| s.room == room)
    }

    /// Sum of rewards for the completed challenges that exist in this catalog.
    #[must_use]
    pub fn total_reward(&self, completed: &[String]) -> u32 {
        self.challenges
            .iter()
            .filter(|c| completed.contains(&c.id))
            .fold(0_u32, |acc, c| acc.saturating_add(c.xp_reward))
    }

    /// Check structural invariants: unique ids, sane fields, resolvable
    /// references and acyclic prerequisite graphs.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut challenge_ids = HashSet::new();
        for challenge in &self.challenges {
            if !challenge_ids.insert(challenge.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "challenge",
                    id: challenge.id.clone(),
                });
            }
        }
        let mut skill_ids = HashSet::new();
        for skill in &self.skills {
            if !skill_ids.insert(skill.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "skill",
                    id: skill.id.clone(),
                });
            }
        }

        for challenge in &self.challenges {
            validate_challenge_fields(challenge)?;
            let owner = format!("challenge `{}`", challenge.id);
            ensure_known(&owner, "challenge", &challenge.prerequisites, &challenge_ids)?;
            ensure_known(&owner, "skill", &challenge.skills_taught, &skill_ids)?;
        }
        for skill in &self.skills {
            let owner = format!("skill `{}`", skill.id);
            ensure_known(&owner, "skill", &skill.prerequisites, &skill_ids)?;
            ensure_known(&owner, "challenge", &skill.challenges_required, &challenge_ids)?;
        }

        let challenge_graph: HashMap<&str, &[String]> = self
            .challenges
            .iter()
            .map(|c| (c.id.as_str(), c.prerequisites.as_slice()))
            .collect();
        ensure_acyclic("challenge", &challenge_graph)?;
        let skill_graph: HashMap<&str, &[String]> = self
            .skills
            .iter()
            .map(|s| (s.id.as_str(), s.prerequisites.as_slice()))
            .collect();
        ensure_acyclic("skill", &skill_graph)
    }
}

fn validate_challenge_fields(challenge: &Challenge) -> Result<(), CatalogError> {
    if !(1..=5).contains(&challenge.difficulty) {
        return Err(CatalogError::DifficultyOutOfRange {
            id: challenge.id.clone(),
            difficulty: challenge.difficulty,
        });
    }
    if challenge.xp_reward == 0 {
        return Err(CatalogError::ZeroReward(challenge.id.clone()));
    }
    if !challenge.has_option(&challenge.correct_answer) {
        return Err(CatalogError::AnswerNotAnOption {
            id: challenge.id.clone(),
            answer: challenge.correct_answer.clone(),
        });
    }
    let mut hint_ids = HashSet::new();
    for hint in &challenge.hints {
        if !hint_ids.insert(hint.id.as_str()) {
            return Err(CatalogError::DuplicateHint {
                challenge: challenge.id.clone(),
                hint: hint.id.clone(),
            });
        }
    }
    Ok(())
}

fn ensure_known(
    owner: &str,
    kind: &'static str,
    ids: &[String],
    known: &HashSet<&str>,
) -> Result<(), CatalogError> {
    match ids.iter().find(|id| !known.contains(id.as_str())) {
        Some(missing) => Err(CatalogError::DanglingReference {
            owner: owner.to_string(),
            kind,
            id: missing.clone(),
        }),
        None => Ok(()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

fn ensure_acyclic(
    kind: &'static str,
    graph: &HashMap<&str, &[String]>,
) -> Result<(), CatalogError> {
    let mut marks: HashMap<&str, Visit> = HashMap::new();
    let mut roots: Vec<&str> = graph.keys().copied().collect();
    roots.sort_unstable();
    for root in roots {
        if marks.contains_key(root) {
            continue;
        }
        // Iterative DFS: (node, index of next edge to follow).
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        marks.insert(root, Visit::InProgress);
        while let Some((node, edge)) = stack.pop() {
            let edges = graph.get(node).copied().unwrap_or_default();
            if let Some(next) = edges.get(edge) {
                stack.push((node, edge + 1));
                let next = next.as_str();
                match marks.get(next) {
                    Some(Visit::InProgress) => {
                        return Err(CatalogError::PrerequisiteCycle {
                            kind,
                            id: next.to_string(),
                        });
                    }
                    Some(Visit::Done) => {}
                    None => {
                        marks.insert(next, Visit::InProgress);
                        stack.push((next, 0));
                    }
                }
            } else {
                marks.insert(node, Visit::Done);
            }
        }
    }
    Ok(())
}
