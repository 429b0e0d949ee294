//! Read-only availability queries over a catalog and a completed set.
//!
//! Rooms open in a fixed order: the tutorial is always open, every other room
//! needs the tutorial's operator challenges, and rooms after upload also need
//! the operator challenges of the room before them. The phase is global.
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Challenge, Phase, Room};
use crate::error::GameError;
use crate::progression::{ProgressionRecord, SkillGap, skill_gap};

fn all_completed<'a, I>(mut challenges: I, completed: &[String]) -> bool
where
    I: Iterator<Item = &'a Challenge>,
{
    challenges.all(|challenge| completed.contains(&challenge.id))
}

fn operator_complete(catalog: &Catalog, room: Room, completed: &[String]) -> bool {
    all_completed(
        catalog
            .challenges_in_room(room)
            .filter(|c| c.phase == Phase::Operator),
        completed,
    )
}

#[must_use]
pub fn is_room_unlocked(catalog: &Catalog, room: Room, completed: &[String]) -> bool {
    if room == Room::Tutorial {
        return true;
    }
    if !operator_complete(catalog, Room::Tutorial, completed) {
        return false;
    }
    match room.previous() {
        Some(previous) if room.unlock_index() > 1 => {
            operator_complete(catalog, previous, completed)
        }
        _ => true,
    }
}

#[must_use]
pub fn unlocked_room_count(catalog: &Catalog, completed: &[String]) -> usize {
    Room::ALL
        .iter()
        .filter(|&&room| is_room_unlocked(catalog, room, completed))
        .count()
}

/// Architect once every engineer challenge is done, engineer once every
/// operator challenge is done, operator otherwise.
#[must_use]
pub fn calculate_phase(catalog: &Catalog, completed: &[String]) -> Phase {
    if all_completed(catalog.challenges_in_phase(Phase::Engineer), completed) {
        Phase::Architect
    } else if all_completed(catalog.challenges_in_phase(Phase::Operator), completed) {
        Phase::Engineer
    } else {
        Phase::Operator
    }
}

fn is_available_in(
    catalog: &Catalog,
    challenge: &Challenge,
    completed: &[String],
    phase: Phase,
) -> bool {
    !completed.contains(&challenge.id)
        && is_room_unlocked(catalog, challenge.room, completed)
        && challenge.phase <= phase
        && challenge
            .prerequisites
            .iter()
            .all(|id| completed.contains(id))
}

/// Challenges the player may attempt now, in catalog order.
#[must_use]
pub fn available_challenges<'a>(catalog: &'a Catalog, completed: &[String]) -> Vec<&'a Challenge> {
    let phase = calculate_phase(catalog, completed);
    catalog
        .challenges
        .iter()
        .filter(|challenge| is_available_in(catalog, challenge, completed, phase))
        .collect()
}

#[must_use]
pub fn is_challenge_available(catalog: &Catalog, challenge: &Challenge, completed: &[String]) -> bool {
    is_available_in(
        catalog,
        challenge,
        completed,
        calculate_phase(catalog, completed),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Completed,
    Available,
    Locked,
}

/// # Errors
///
/// Returns [`GameError::UnknownChallenge`] for ids missing from the catalog.
pub fn challenge_status(
    catalog: &Catalog,
    challenge_id: &str,
    completed: &[String],
) -> Result<ChallengeStatus, GameError> {
    let challenge = catalog.challenge(challenge_id)?;
    Ok(if completed.contains(&challenge.id) {
        ChallengeStatus::Completed
    } else if is_challenge_available(catalog, challenge, completed) {
        ChallengeStatus::Available
    } else {
        ChallengeStatus::Locked
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatus {
    pub room: Room,
    pub unlocked: bool,
    pub completed: usize,
    pub total: usize,
}

#[must_use]
pub fn room_statuses(catalog: &Catalog, completed: &[String]) -> Vec<RoomStatus> {
    Room::ALL
        .iter()
        .map(|&room| {
            let (done, total) = catalog
                .challenges_in_room(room)
                .fold((0, 0), |(done, total), c| {
                    (done + usize::from(completed.contains(&c.id)), total + 1)
                });
            RoomStatus {
                room,
                unlocked: is_room_unlocked(catalog, room, completed),
                completed: done,
                total,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillStatus {
    pub id: String,
    pub room: Room,
    pub unlocked: bool,
    /// Requirements met but not yet recorded as unlocked.
    pub ready: bool,
    pub gap: SkillGap,
}

#[must_use]
pub fn skill_statuses(catalog: &Catalog, record: &ProgressionRecord) -> Vec<SkillStatus> {
    catalog
        .skills
        .iter()
        .map(|skill| {
            let unlocked = record.has_skill(&skill.id);
            let gap = skill_gap(record, catalog, skill);
            SkillStatus {
                id: skill.id.clone(),
                room: skill.room,
                unlocked,
                ready: !unlocked && gap.is_empty(),
                gap,
            }
        })
        .collect()
}
