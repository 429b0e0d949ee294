use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use fixit_game::constants::STORAGE_KEY;
use fixit_game::{
    ChallengeStatus, FileStore, GameEvent, GameRules, GameStore, KeyValueStore, ManualClock,
    MemoryStore, Notice, Phase, ProgressionConfig, Room,
};

fn rules() -> GameRules {
    GameRules::bundled(ProgressionConfig::default())
}

fn clock() -> ManualClock {
    ManualClock::starting_at(NaiveDate::from_ymd_opt(2025, 10, 6).unwrap())
}

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fixit-game-{label}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn answer_next<S: KeyValueStore>(store: &mut GameStore<S, &ManualClock>) -> Option<String> {
    let (id, answer) = store
        .available_challenges()
        .first()
        .map(|c| (c.id.clone(), c.correct_answer.clone()))?;
    store
        .dispatch(GameEvent::SubmitAnswer {
            challenge_id: id.clone(),
            answer_id: answer,
        })
        .unwrap();
    Some(id)
}

#[test]
fn full_campaign_reaches_architect_with_every_skill() {
    let clock = clock();
    let mut store = GameStore::bootstrap(rules(), MemoryStore::new(), &clock);
    let mut rooms_seen = Vec::new();
    while let Some(id) = answer_next(&mut store) {
        let room = store.rules().catalog.challenge(&id).unwrap().room;
        if !rooms_seen.contains(&room) {
            rooms_seen.push(room);
        }
    }

    let catalog = &store.rules().catalog;
    let progression = store.progression();
    assert_eq!(progression.completed_challenges.len(), catalog.challenges.len());
    assert_eq!(progression.xp, catalog.total_reward(&progression.completed_challenges));
    assert_eq!(progression.level, 11);
    assert_eq!(progression.unlocked_skills.len(), catalog.skills.len());
    assert_eq!(store.phase(), Phase::Architect);
    assert_eq!(rooms_seen, Room::ALL.to_vec());
    assert!(store.room_statuses().iter().all(|s| s.unlocked && s.completed == s.total));

    for id in [
        "first-fix",
        "ten-fixes",
        "factory-veteran",
        "daily-goal",
        "perfect-5",
        "architect-phase",
        "skill-collector",
        "screens-master",
    ] {
        assert!(progression.has_achievement(id), "missing {id}");
    }
    assert!(!progression.has_achievement("streak-3"));
}

#[test]
fn rooms_open_in_order_during_play() {
    let clock = clock();
    let mut store = GameStore::bootstrap(rules(), MemoryStore::new(), &clock);
    assert_eq!(
        store.challenge_status("upload-1-schema-mismatch"),
        Ok(ChallengeStatus::Locked)
    );
    for _ in 0..8 {
        answer_next(&mut store).unwrap();
    }
    let statuses = store.room_statuses();
    assert!(statuses[1].unlocked, "upload opens after the tutorial");
    assert!(!statuses[2].unlocked);
    assert_eq!(
        store.challenge_status("upload-1-schema-mismatch"),
        Ok(ChallengeStatus::Available)
    );
    assert!(store.skill_statuses().iter().any(|s| s.unlocked));
}

#[test]
fn streak_builds_across_daily_sessions() {
    let clock = clock();
    let memory = MemoryStore::new();
    for _ in 0..7 {
        let mut store = GameStore::bootstrap(rules(), memory.clone(), &clock);
        answer_next(&mut store).unwrap();
        clock.advance_days(1);
    }
    let store = GameStore::bootstrap(rules(), memory, &clock);
    assert_eq!(store.streak().current, 7);
    assert_eq!(store.streak().longest, 7);
    assert_eq!(store.streak().freezes_available, 2);
    assert!(store.progression().has_achievement("streak-7"));
}

#[test]
fn long_absence_without_freezes_resets_streak() {
    let clock = clock();
    let memory = MemoryStore::new();
    {
        let mut store = GameStore::bootstrap(rules(), memory.clone(), &clock);
        answer_next(&mut store).unwrap();
        store.dispatch(GameEvent::UseStreakFreeze).unwrap();
        store.dispatch(GameEvent::UseStreakFreeze).unwrap();
        assert!(store.dispatch(GameEvent::UseStreakFreeze).unwrap().is_empty());
    }
    clock.advance_days(5);
    let store = GameStore::bootstrap(rules(), memory, &clock);
    assert_eq!(store.streak().current, 0);
    assert!(
        store
            .last_notices()
            .contains(&Notice::StreakReset { lost: 1 })
    );
}

#[test]
fn file_store_persists_between_sessions() {
    let dir = temp_dir("persist");
    let clock = clock();
    {
        let mut store = GameStore::bootstrap(rules(), FileStore::new(&dir), &clock);
        answer_next(&mut store).unwrap();
        answer_next(&mut store).unwrap();
    }
    let path = dir.join(format!("{STORAGE_KEY}.json"));
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("completedChallenges"));

    let store = GameStore::bootstrap(rules(), FileStore::new(&dir), &clock);
    assert_eq!(store.progression().completed_challenges.len(), 2);
    assert_eq!(store.progression().xp, 100);

    fs::write(&path, "{ definitely not json").unwrap();
    let recovered = GameStore::bootstrap(rules(), FileStore::new(&dir), &clock);
    assert_eq!(recovered.progression().xp, 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failed_saves_keep_in_memory_progress() {
    let clock = clock();
    let memory = MemoryStore::new();
    memory.set_fail_writes(true);
    let mut store = GameStore::bootstrap(rules(), memory.clone(), &clock);
    answer_next(&mut store).unwrap();
    assert_eq!(store.progression().xp, 50);
    assert!(memory.raw(STORAGE_KEY).is_none());
}

#[test]
fn legacy_achievement_objects_load() {
    let clock = clock();
    let memory = MemoryStore::new();
    {
        let mut store = GameStore::bootstrap(rules(), memory.clone(), &clock);
        answer_next(&mut store).unwrap();
    }
    let mut json: serde_json::Value =
        serde_json::from_str(&memory.raw(STORAGE_KEY).unwrap()).unwrap();
    json["achievements"] = serde_json::json!([{ "id": "first-fix", "icon": "x" }]);
    json["level"] = serde_json::json!(9);
    memory.set(STORAGE_KEY, &json.to_string()).unwrap();

    let store = GameStore::bootstrap(rules(), memory, &clock);
    assert!(store.progression().has_achievement("first-fix"));
    assert_eq!(store.progression().level, 1);
}
