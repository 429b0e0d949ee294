//! The single pure reducer that turns an event into the next session snapshot.
use serde_json::json;

use crate::achievements::{unlock_achievement, unlock_earned_achievements};
use crate::clock::Moment;
use crate::constants::{
    LOG_ACHIEVEMENT_UNLOCKED, LOG_ANSWER_REJECTED, LOG_CHALLENGE_COMPLETED,
    LOG_CHALLENGE_REPLAYED, LOG_DAILY_GOAL, LOG_HINT_REVEALED, LOG_LEVEL_UP,
    LOG_PROGRESS_LOADED, LOG_PROGRESS_RESET, LOG_SKILL_UNLOCKED, LOG_STREAK_FROZEN,
    LOG_STREAK_RESET,
};
use crate::error::GameError;
use crate::progression::{
    CompletionKind, ProgressionRecord, StreakMaintenance, complete_challenge, run_maintenance,
    try_unlock_skill, unlock_earned_skills, use_streak_freeze,
};
use crate::session::{
    ActiveLevel, GameEvent, GameRules, LogLevel, LogSource, Notice, SessionState, Transition,
};
use crate::unlocks::is_challenge_available;

/// Apply `event` to `state`.
///
/// The input is never modified; a rejected event leaves the caller holding the
/// unchanged snapshot.
///
/// # Errors
///
/// Returns a [`GameError`] when the event references an unknown challenge,
/// skill, hint, answer or achievement, submits an answer to a locked challenge,
/// or asks for a skill whose requirements are outstanding.
pub fn reduce(
    state: &SessionState,
    event: GameEvent,
    rules: &GameRules,
    moment: Moment,
) -> Result<Transition, GameError> {
    let mut step = Step {
        state: state.clone(),
        notices: Vec::new(),
        rules,
        moment,
    };
    match event {
        GameEvent::SetRoom { room } => step.state.current_room = room,
        GameEvent::StartLevel { level_id, room } => {
            step.state.current_room = room;
            step.state.current_level = Some(ActiveLevel {
                id: level_id,
                room,
                started_at_ms: moment.timestamp_ms,
            });
        }
        GameEvent::CompleteLevel { level_id, score } => {
            if !step.state.completed_levels.contains(&level_id) {
                step.state.completed_levels.push(level_id);
            }
            step.state.score = step.state.score.saturating_add(score);
            step.state.current_level = None;
        }
        GameEvent::AddLog {
            level,
            source,
            message,
            details,
        } => step.log(level, source, message, details),
        GameEvent::UpdateRoomState { room, patch } => step.state.merge_room_state(room, patch),
        GameEvent::RevealHint {
            challenge_id,
            hint_id,
        } => step.reveal_hint(&challenge_id, &hint_id)?,
        GameEvent::SubmitAnswer {
            challenge_id,
            answer_id,
        } => step.submit_answer(&challenge_id, &answer_id)?,
        GameEvent::CompleteChallenge {
            challenge_id,
            xp_earned,
            hints_used,
        } => {
            rules.catalog.challenge(&challenge_id)?;
            step.complete(&challenge_id, xp_earned, &hints_used);
        }
        GameEvent::UnlockSkill { skill_id } => {
            let unlocked = try_unlock_skill(&step.state.progression, &rules.catalog, &skill_id)?;
            if let Some(next) = unlocked {
                step.state.progression = next;
                step.skill_unlocked(skill_id);
                step.award_achievements();
            }
        }
        GameEvent::RunStreakMaintenance => step.maintain(),
        GameEvent::UseStreakFreeze => {
            let streak = use_streak_freeze(&step.state.progression.streak);
            if streak != step.state.progression.streak {
                step.state.progression.streak = streak;
                step.streak_frozen();
            }
        }
        GameEvent::UnlockAchievement { achievement_id } => {
            if let Some(next) =
                unlock_achievement(&step.state.progression, &rules.achievements, &achievement_id)?
            {
                step.state.progression = next;
                step.achievement_unlocked(achievement_id);
            }
        }
        GameEvent::ResetProgress => {
            let fresh = ProgressionRecord::fresh(moment.today, &rules.config);
            let logs = std::mem::take(&mut step.state.logs);
            let next_log_id = step.state.next_log_id;
            step.state = SessionState {
                logs,
                next_log_id,
                ..SessionState::new(fresh)
            };
            step.system_log(LogLevel::Warn, LOG_PROGRESS_RESET, None);
            step.notices.push(Notice::ProgressReset);
        }
        GameEvent::LoadProgression { record } => {
            step.state.progression = record.normalized(&rules.config);
            step.state.revealed_hints.clear();
            let details = json!({
                "xp": step.state.progression.xp,
                "completed": step.state.progression.completed_challenges.len(),
            });
            step.system_log(LogLevel::Info, LOG_PROGRESS_LOADED, Some(details));
            step.award_achievements();
        }
    }
    Ok(Transition {
        state: step.state,
        notices: step.notices,
    })
}

struct Step<'r> {
    state: SessionState,
    notices: Vec<Notice>,
    rules: &'r GameRules,
    moment: Moment,
}

impl Step<'_> {
    fn log(
        &mut self,
        level: LogLevel,
        source: LogSource,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        self.state.push_log(
            self.rules.config.log_capacity,
            self.moment.timestamp_ms,
            level,
            source,
            message,
            details,
        );
    }

    fn system_log(&mut self, level: LogLevel, key: &str, details: Option<serde_json::Value>) {
        self.log(level, LogSource::System, key, details);
    }

    fn reveal_hint(&mut self, challenge_id: &str, hint_id: &str) -> Result<(), GameError> {
        let rules = self.rules;
        let challenge = rules.catalog.challenge(challenge_id)?;
        let hint = challenge.hint(hint_id).ok_or_else(|| GameError::UnknownHint {
            challenge: challenge_id.to_string(),
            hint: hint_id.to_string(),
        })?;
        let xp_cost = hint.xp_cost;
        let room = challenge.room;
        let revealed = self
            .state
            .revealed_hints
            .entry(challenge_id.to_string())
            .or_default();
        if revealed.iter().any(|id| id == hint_id) {
            return Ok(());
        }
        revealed.push(hint_id.to_string());
        self.log(
            LogLevel::Info,
            LogSource::Room(room),
            LOG_HINT_REVEALED,
            Some(json!({ "challenge": challenge_id, "hint": hint_id, "cost": xp_cost })),
        );
        self.notices.push(Notice::HintRevealed {
            challenge_id: challenge_id.to_string(),
            hint_id: hint_id.to_string(),
            xp_cost,
        });
        Ok(())
    }

    fn submit_answer(&mut self, challenge_id: &str, answer_id: &str) -> Result<(), GameError> {
        let rules = self.rules;
        let challenge = rules.catalog.challenge(challenge_id)?;
        if !challenge.has_option(answer_id) {
            return Err(GameError::UnknownAnswer {
                challenge: challenge_id.to_string(),
                answer: answer_id.to_string(),
            });
        }
        let progression = &self.state.progression;
        if !progression.is_completed(challenge_id)
            && !is_challenge_available(
                &rules.catalog,
                challenge,
                &progression.completed_challenges,
            )
        {
            return Err(GameError::ChallengeLocked(challenge_id.to_string()));
        }

        if challenge.correct_answer != answer_id {
            self.log(
                LogLevel::Warn,
                LogSource::Room(challenge.room),
                LOG_ANSWER_REJECTED,
                Some(json!({ "challenge": challenge_id, "answer": answer_id })),
            );
            self.notices.push(Notice::AnswerRejected {
                challenge_id: challenge_id.to_string(),
                answer_id: answer_id.to_string(),
            });
            return Ok(());
        }

        let hints = self
            .state
            .revealed_hints
            .remove(challenge_id)
            .unwrap_or_default();
        let xp = challenge.reward_after_hints(&hints);
        self.complete(challenge_id, xp, &hints);
        Ok(())
    }

    fn complete(&mut self, challenge_id: &str, xp_earned: u32, hints_used: &[String]) {
        let before = &self.state.progression;
        let kind = CompletionKind::for_record(before, challenge_id);
        let level_before = before.level;
        let goal_met_before =
            before.daily_progress.date == self.moment.today && before.daily_progress.goal_met;

        let next = complete_challenge(
            before,
            challenge_id,
            xp_earned,
            hints_used,
            &self.rules.config,
            self.moment,
        );
        self.state.progression = next;
        self.state.score = self.state.score.saturating_add(u64::from(xp_earned));

        let source = self
            .rules
            .catalog
            .challenge(challenge_id)
            .map_or(LogSource::System, |c| LogSource::Room(c.room));
        let key = match kind {
            CompletionKind::First => LOG_CHALLENGE_COMPLETED,
            CompletionKind::Replay => LOG_CHALLENGE_REPLAYED,
        };
        self.log(
            LogLevel::Info,
            source,
            key,
            Some(json!({ "challenge": challenge_id, "xp": xp_earned, "hints": hints_used })),
        );
        self.notices.push(Notice::ChallengeCompleted {
            challenge_id: challenge_id.to_string(),
            xp_earned,
            kind,
        });

        let level_after = self.state.progression.level;
        if level_after > level_before {
            self.system_log(
                LogLevel::Info,
                LOG_LEVEL_UP,
                Some(json!({ "from": level_before, "to": level_after })),
            );
            self.notices.push(Notice::LevelUp {
                from: level_before,
                to: level_after,
            });
        }

        let daily = &self.state.progression.daily_progress;
        if daily.goal_met && !goal_met_before {
            let completed = daily.challenges_completed;
            self.system_log(
                LogLevel::Info,
                LOG_DAILY_GOAL,
                Some(json!({ "completed": completed })),
            );
            self.notices.push(Notice::DailyGoalMet { completed });
        }

        let (with_skills, unlocked) =
            unlock_earned_skills(&self.state.progression, &self.rules.catalog);
        self.state.progression = with_skills;
        for skill_id in unlocked {
            self.skill_unlocked(skill_id);
        }
        self.award_achievements();
    }

    fn award_achievements(&mut self) {
        let (next, earned) = unlock_earned_achievements(
            &self.state.progression,
            &self.rules.catalog,
            &self.rules.achievements,
        );
        self.state.progression = next;
        for achievement_id in earned {
            self.achievement_unlocked(achievement_id);
        }
    }

    fn skill_unlocked(&mut self, skill_id: String) {
        self.system_log(
            LogLevel::Info,
            LOG_SKILL_UNLOCKED,
            Some(json!({ "skill": skill_id })),
        );
        self.notices.push(Notice::SkillUnlocked { skill_id });
    }

    fn achievement_unlocked(&mut self, achievement_id: String) {
        self.system_log(
            LogLevel::Info,
            LOG_ACHIEVEMENT_UNLOCKED,
            Some(json!({ "achievement": achievement_id })),
        );
        self.notices
            .push(Notice::AchievementUnlocked { achievement_id });
    }

    fn streak_frozen(&mut self) {
        let streak = &self.state.progression.streak;
        let (current, freezes_left) = (streak.current, streak.freezes_available);
        self.system_log(
            LogLevel::Info,
            LOG_STREAK_FROZEN,
            Some(json!({ "current": current, "freezesLeft": freezes_left })),
        );
        self.notices.push(Notice::StreakFrozen {
            current,
            freezes_left,
        });
    }

    fn maintain(&mut self) {
        let lost = self.state.progression.streak.current;
        let (next, outcome) = run_maintenance(&self.state.progression, self.moment.today);
        self.state.progression = next;
        match outcome {
            StreakMaintenance::Unchanged => {}
            StreakMaintenance::Frozen => self.streak_frozen(),
            StreakMaintenance::Reset => {
                self.system_log(
                    LogLevel::Warn,
                    LOG_STREAK_RESET,
                    Some(json!({ "lost": lost })),
                );
                self.notices.push(Notice::StreakReset { lost });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Room;
    use crate::config::ProgressionConfig;
    use chrono::NaiveDate;

    const UPLOAD_1: &str = "upload-1-schema-mismatch";
    const TUTORIAL_1: &str = "tutorial-1-what-is-webapp";

    fn rules() -> GameRules {
        GameRules::bundled(ProgressionConfig::default())
    }

    fn moment(d: u32) -> Moment {
        Moment::new(NaiveDate::from_ymd_opt(2025, 3, d).unwrap(), i64::from(d))
    }

    fn fresh_state() -> SessionState {
        SessionState::new(ProgressionRecord::fresh(
            moment(1).today,
            &ProgressionConfig::default(),
        ))
    }

    fn apply(state: &SessionState, event: GameEvent) -> Transition {
        reduce(state, event, &rules(), moment(1)).unwrap()
    }

    #[test]
    fn raw_completion_accepts_locked_catalog_challenge() {
        let t = apply(
            &fresh_state(),
            GameEvent::CompleteChallenge {
                challenge_id: UPLOAD_1.into(),
                xp_earned: 100,
                hints_used: Vec::new(),
            },
        );
        let p = &t.state.progression;
        assert_eq!(p.xp, 100);
        assert_eq!(p.level, 2);
        assert!(t.notices.contains(&Notice::LevelUp { from: 1, to: 2 }));
        assert!(t.notices.contains(&Notice::AchievementUnlocked {
            achievement_id: "first-fix".into()
        }));
    }

    #[test]
    fn unknown_challenge_is_rejected() {
        let err = reduce(
            &fresh_state(),
            GameEvent::CompleteChallenge {
                challenge_id: "upload-1-typo".into(),
                xp_earned: 100,
                hints_used: Vec::new(),
            },
            &rules(),
            moment(1),
        )
        .unwrap_err();
        assert_eq!(err, GameError::UnknownChallenge("upload-1-typo".into()));
    }

    #[test]
    fn locked_challenge_cannot_be_answered() {
        let err = reduce(
            &fresh_state(),
            GameEvent::SubmitAnswer {
                challenge_id: UPLOAD_1.into(),
                answer_id: "b".into(),
            },
            &rules(),
            moment(1),
        )
        .unwrap_err();
        assert_eq!(err, GameError::ChallengeLocked(UPLOAD_1.into()));
    }

    #[test]
    fn wrong_answer_changes_nothing_but_logs() {
        let state = fresh_state();
        let t = apply(
            &state,
            GameEvent::SubmitAnswer {
                challenge_id: TUTORIAL_1.into(),
                answer_id: "a".into(),
            },
        );
        assert_eq!(t.state.progression, state.progression);
        assert_eq!(t.state.logs[0].message, LOG_ANSWER_REJECTED);
        assert!(matches!(t.notices[0], Notice::AnswerRejected { .. }));
    }

    #[test]
    fn hints_reduce_reward_and_are_spent() {
        let revealed = apply(
            &fresh_state(),
            GameEvent::RevealHint {
                challenge_id: TUTORIAL_1.into(),
                hint_id: "h1".into(),
            },
        );
        assert_eq!(revealed.state.revealed_for(TUTORIAL_1), ["h1".to_string()]);
        let t = apply(
            &revealed.state,
            GameEvent::SubmitAnswer {
                challenge_id: TUTORIAL_1.into(),
                answer_id: "b".into(),
            },
        );
        assert_eq!(t.state.progression.xp, 40);
        assert!(t.state.revealed_for(TUTORIAL_1).is_empty());
        let attempt = t.state.progression.attempt(TUTORIAL_1).unwrap();
        assert_eq!(attempt.hints_used, vec!["h1".to_string()]);
    }

    #[test]
    fn unknown_hint_is_rejected() {
        let err = reduce(
            &fresh_state(),
            GameEvent::RevealHint {
                challenge_id: TUTORIAL_1.into(),
                hint_id: "h9".into(),
            },
            &rules(),
            moment(1),
        )
        .unwrap_err();
        assert!(matches!(err, GameError::UnknownHint { .. }));
    }

    #[test]
    fn replay_is_rewarded_and_flagged() {
        let once = apply(
            &fresh_state(),
            GameEvent::SubmitAnswer {
                challenge_id: TUTORIAL_1.into(),
                answer_id: "b".into(),
            },
        );
        let twice = apply(
            &once.state,
            GameEvent::SubmitAnswer {
                challenge_id: TUTORIAL_1.into(),
                answer_id: "b".into(),
            },
        );
        assert_eq!(twice.state.progression.xp, 100);
        assert_eq!(twice.state.score, 100);
        assert!(
            twice
                .state
                .logs
                .iter()
                .any(|l| l.message == LOG_CHALLENGE_REPLAYED)
        );
        assert!(twice.notices.contains(&Notice::LevelUp { from: 1, to: 2 }));
        assert!(twice.notices.contains(&Notice::ChallengeCompleted {
            challenge_id: TUTORIAL_1.into(),
            xp_earned: 50,
            kind: CompletionKind::Replay,
        }));
    }

    #[test]
    fn load_awards_achievements_the_record_already_earned() {
        let mut stored = fresh_state().progression;
        stored.xp = 5_000;
        stored.level = 1;
        let t = apply(
            &fresh_state(),
            GameEvent::LoadProgression {
                record: Box::new(stored),
            },
        );
        assert!(t.state.progression.level >= 5);
        assert!(t.state.progression.has_achievement("level-5"));
        assert!(t.notices.contains(&Notice::AchievementUnlocked {
            achievement_id: "level-5".into()
        }));
    }

    #[test]
    fn set_room_and_levels_update_session_fields() {
        let t = apply(&fresh_state(), GameEvent::SetRoom { room: Room::Clean });
        assert_eq!(t.state.current_room, Room::Clean);
        let started = apply(
            &t.state,
            GameEvent::StartLevel {
                level_id: "lvl-1".into(),
                room: Room::Store,
            },
        );
        assert_eq!(started.state.current_room, Room::Store);
        assert!(started.state.current_level.is_some());
        let done = apply(
            &started.state,
            GameEvent::CompleteLevel {
                level_id: "lvl-1".into(),
                score: 30,
            },
        );
        assert_eq!(done.state.score, 30);
        assert_eq!(done.state.completed_levels, vec!["lvl-1".to_string()]);
        assert!(done.state.current_level.is_none());
    }

    #[test]
    fn reset_keeps_log_history() {
        let completed = apply(
            &fresh_state(),
            GameEvent::CompleteChallenge {
                challenge_id: TUTORIAL_1.into(),
                xp_earned: 50,
                hints_used: Vec::new(),
            },
        );
        let reset = apply(&completed.state, GameEvent::ResetProgress);
        assert_eq!(reset.state.progression.xp, 0);
        assert!(reset.state.progression.completed_challenges.is_empty());
        assert_eq!(reset.state.logs[0].message, LOG_PROGRESS_RESET);
        assert!(reset.state.logs.len() > 1);
        assert_eq!(reset.notices, vec![Notice::ProgressReset]);
    }

    #[test]
    fn manual_freeze_emits_notice_once_available() {
        let t = apply(&fresh_state(), GameEvent::UseStreakFreeze);
        assert_eq!(t.state.progression.streak.freezes_available, 1);
        assert_eq!(
            t.notices,
            vec![Notice::StreakFrozen {
                current: 0,
                freezes_left: 1
            }]
        );
    }
}
