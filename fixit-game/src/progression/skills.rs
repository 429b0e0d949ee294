//! Skill unlocking with prerequisite checks kept inside the transition.
use serde::{Deserialize, Serialize};

use super::ProgressionRecord;
use crate::catalog::{Catalog, Skill};
use crate::error::GameError;

/// What still stands between a player and a skill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGap {
    pub missing_challenges: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl SkillGap {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_challenges.is_empty() && self.missing_skills.is_empty()
    }
}

/// A prerequisite counts when it is unlocked or could be unlocked right now,
/// which includes its own prerequisites all the way down. `path` holds the
/// skills being checked so a cyclic catalog cannot recurse forever.
fn prerequisite_satisfied<'c>(
    record: &ProgressionRecord,
    catalog: &'c Catalog,
    skill_id: &'c str,
    path: &mut Vec<&'c str>,
) -> bool {
    if record.has_skill(skill_id) {
        return true;
    }
    if path.contains(&skill_id) {
        return false;
    }
    let Ok(skill) = catalog.skill(skill_id) else {
        return false;
    };
    path.push(skill_id);
    let earned = skill.requirements_met(&record.completed_challenges)
        && skill
            .prerequisites
            .iter()
            .all(|id| prerequisite_satisfied(record, catalog, id, path));
    path.pop();
    earned
}

/// Required challenges not yet completed plus prerequisite skills neither
/// unlocked nor earned.
#[must_use]
pub fn skill_gap(record: &ProgressionRecord, catalog: &Catalog, skill: &Skill) -> SkillGap {
    let mut path = vec![skill.id.as_str()];
    SkillGap {
        missing_challenges: skill
            .challenges_required
            .iter()
            .filter(|id| !record.is_completed(id))
            .cloned()
            .collect(),
        missing_skills: skill
            .prerequisites
            .iter()
            .filter(|id| !prerequisite_satisfied(record, catalog, id.as_str(), &mut path))
            .cloned()
            .collect(),
    }
}

fn ready_to_unlock(record: &ProgressionRecord, skill: &Skill) -> bool {
    skill.requirements_met(&record.completed_challenges)
        && skill.prerequisites.iter().all(|id| record.has_skill(id))
}

/// Unlock `skill_id` if its requirements are met.
///
/// Returns `Ok(None)` when the skill is already unlocked.
///
/// # Errors
///
/// [`GameError::UnknownSkill`] for ids missing from the catalog and
/// [`GameError::SkillLocked`] when requirements are outstanding.
pub fn try_unlock_skill(
    record: &ProgressionRecord,
    catalog: &Catalog,
    skill_id: &str,
) -> Result<Option<ProgressionRecord>, GameError> {
    let skill = catalog.skill(skill_id)?;
    if record.has_skill(skill_id) {
        return Ok(None);
    }
    let gap = skill_gap(record, catalog, skill);
    if !gap.is_empty() {
        return Err(GameError::SkillLocked {
            skill: skill_id.to_string(),
            missing_challenges: gap.missing_challenges,
            missing_skills: gap.missing_skills,
        });
    }
    Ok(Some(record.with_skill(skill_id)))
}

/// Unlock every skill the record has earned, repeating until nothing changes.
///
/// A skill unlocks only once all its prerequisites are held, so prerequisites
/// always precede their dependents in the returned order. Returns the new record and the ids unlocked, in unlock order.
#[must_use]
pub fn unlock_earned_skills(
    record: &ProgressionRecord,
    catalog: &Catalog,
) -> (ProgressionRecord, Vec<String>) {
    let mut current = record.clone();
    let mut unlocked = Vec::new();
    loop {
        let before = unlocked.len();
        for skill in &catalog.skills {
            if current.has_skill(&skill.id) {
                continue;
            }
            if ready_to_unlock(&current, skill) {
                current = current.with_skill(&skill.id);
                unlocked.push(skill.id.clone());
            }
        }
        if unlocked.len() == before {
            break;
        }
    }
    (current, unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Phase, Room};
    use crate::config::ProgressionConfig;
    use chrono::NaiveDate;

    fn skill(id: &str, prereqs: &[&str], required: &[&str]) -> Skill {
        Skill {
            id: id.into(),
            name: id.into(),
            room: Room::Upload,
            phase: Phase::Operator,
            prerequisites: prereqs.iter().map(|s| (*s).to_string()).collect(),
            challenges_required: required.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            challenges: Vec::new(),
            skills: vec![
                skill("advanced", &["basics"], &["c2"]),
                skill("basics", &[], &["c1"]),
                skill("expert", &["advanced"], &["c3"]),
            ],
        }
    }

    fn record(completed: &[&str]) -> ProgressionRecord {
        let mut record = ProgressionRecord::fresh(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            &ProgressionConfig::default(),
        );
        record.completed_challenges = completed.iter().map(|s| (*s).to_string()).collect();
        record
    }

    #[test]
    fn unlock_requires_challenges() {
        let err = try_unlock_skill(&record(&[]), &catalog(), "basics").unwrap_err();
        assert_eq!(
            err,
            GameError::SkillLocked {
                skill: "basics".into(),
                missing_challenges: vec!["c1".into()],
                missing_skills: vec![],
            }
        );
    }

    #[test]
    fn prerequisite_skill_counts_when_earned_but_not_stored() {
        let next = try_unlock_skill(&record(&["c1", "c2"]), &catalog(), "advanced")
            .unwrap()
            .unwrap();
        assert!(next.has_skill("advanced"));
        assert!(!next.has_skill("basics"));
    }

    #[test]
    fn unearned_prerequisite_blocks_unlock() {
        let err = try_unlock_skill(&record(&["c2"]), &catalog(), "advanced").unwrap_err();
        assert!(matches!(
            err,
            GameError::SkillLocked { ref missing_skills, .. } if missing_skills == &vec!["basics".to_string()]
        ));
    }

    #[test]
    fn unlocking_twice_is_a_no_op() {
        let once = try_unlock_skill(&record(&["c1"]), &catalog(), "basics")
            .unwrap()
            .unwrap();
        assert_eq!(try_unlock_skill(&once, &catalog(), "basics"), Ok(None));
        assert_eq!(once.unlocked_skills, vec!["basics".to_string()]);
    }

    #[test]
    fn unknown_skill_is_rejected() {
        assert_eq!(
            try_unlock_skill(&record(&[]), &catalog(), "nope"),
            Err(GameError::UnknownSkill("nope".into()))
        );
    }

    #[test]
    fn earned_skills_unlock_to_fixpoint() {
        let (next, unlocked) = unlock_earned_skills(&record(&["c1", "c2", "c3"]), &catalog());
        assert_eq!(unlocked, vec!["basics", "advanced", "expert"]);
        assert!(unlocked.iter().all(|id| next.has_skill(id)));

        let (again, none) = unlock_earned_skills(&next, &catalog());
        assert!(none.is_empty());
        assert_eq!(again, next);
    }

    #[test]
    fn locked_grandparent_blocks_unlock() {
        let err = try_unlock_skill(&record(&["c2", "c3"]), &catalog(), "expert").unwrap_err();
        assert!(matches!(
            err,
            GameError::SkillLocked { ref missing_skills, .. } if missing_skills == &vec!["advanced".to_string()]
        ));
        let (next, unlocked) = unlock_earned_skills(&record(&["c2", "c3"]), &catalog());
        assert!(unlocked.is_empty());
        assert!(next.unlocked_skills.is_empty());
    }

    #[test]
    fn cyclic_prerequisites_never_unlock() {
        let cyclic = Catalog {
            challenges: Vec::new(),
            skills: vec![skill("a", &["b"], &[]), skill("b", &["a"], &[])],
        };
        assert!(try_unlock_skill(&record(&[]), &cyclic, "a").is_err());
        assert!(unlock_earned_skills(&record(&[]), &cyclic).1.is_empty());
    }

    #[test]
    fn chain_stops_at_missing_challenge() {
        let (next, unlocked) = unlock_earned_skills(&record(&["c1", "c3"]), &catalog());
        assert_eq!(unlocked, vec!["basics".to_string()]);
        assert!(!next.has_skill("expert"));
    }
}
