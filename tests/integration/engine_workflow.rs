use std::sync::Arc;
use std::time::Duration;

use habit_streak_engine::actions::*;
use habit_streak_engine::*;
use tempfile::tempdir;

fn jan(day: u32) -> CalendarDay {
    CalendarDay::from_ymd(2024, 1, day).unwrap()
}

fn open_engine(dir: &tempfile::TempDir, today: CalendarDay) -> HabitEngine {
    let storage = SqliteStorage::new(dir.path().join("habits.db")).expect("Failed to create storage");
    HabitEngine::with_parts(storage, Arc::new(FixedClock(today)))
}

fn complete(engine: &HabitEngine, habit_id: &str, date: CalendarDay) {
    let params = ToggleEntryParams {
        habit_id: Some(habit_id.to_string()),
        date: Some(date.to_string()),
        ..Default::default()
    };
    let response = toggle_entry(engine.storage(), engine.clock(), params).expect("toggle failed");
    assert!(response.completed);
}

#[test]
fn test_reconcile_twice_creates_one_entry_per_due_habit() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir, jan(1));
    let user = UserId::new();

    // Monday 2024-01-01
    for (name, rule) in [
        ("Read", RecurrenceRule::daily(jan(1))),
        ("Gym", RecurrenceRule::weekly(jan(1), [0, 2])),
        ("Plants", RecurrenceRule::every_n_days(jan(1), 3)),
    ] {
        let habit = HabitDefinition::new(user.clone(), name.to_string(), None, rule).unwrap();
        engine.storage().create_habit(&habit).unwrap();
    }

    let first = engine.reconcile(jan(2)).unwrap();
    let second = engine.reconcile(jan(2)).unwrap();

    assert_eq!(first.created.len(), 1);
    assert_eq!(first.not_due, 2);
    assert!(second.created.is_empty());
    assert_eq!(second.already_present, 1);
    assert_eq!(engine.storage().get_entries_for_user_on(&user, jan(2)).unwrap().len(), 1);

    let monday = engine.reconcile(jan(1)).unwrap();
    assert_eq!(monday.created.len(), 3);
}

#[test]
fn test_read_scenario_through_nightly_passes() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir, jan(1));
    let user = UserId::new();

    let created = create_habit(engine.storage(), engine.clock(), CreateHabitParams {
        user_id: user.to_string(),
        name: "Read".to_string(),
        recurrence: "daily".to_string(),
        start_date: Some("2024-01-01".to_string()),
        duration_days: Some(10),
        ..Default::default()
    })
    .unwrap();
    assert!(created.due_today);

    for day in 1..=10 {
        if day > 1 {
            engine.run_daily_pass(jan(day)).unwrap();
        }
        if day != 7 {
            complete(&engine, &created.habit_id, jan(day));
        }
    }

    let report = engine.run_daily_pass(jan(11)).unwrap();
    assert_eq!(report.entries_created, 0);
    assert_eq!(report.streaks.habits_refreshed, 1);
    assert_eq!(report.streaks.users_refreshed, 1);

    let habit = engine
        .storage()
        .get_habit(&HabitId::from_string(&created.habit_id).unwrap())
        .unwrap();
    assert_eq!(habit.current_streak, 3);
    assert_eq!(habit.longest_streak, 6);

    let aggregate = engine.storage().get_user_streak(&user).unwrap();
    assert_eq!((aggregate.current_streak, aggregate.longest_streak), (3, 6));
    assert!(aggregate.updated_at.is_some());
}

#[test]
fn test_aggregate_requires_every_due_habit() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir, jan(1));
    let user = UserId::new();

    let mut ids = Vec::new();
    for name in ["Read", "Walk"] {
        let response = create_habit(engine.storage(), engine.clock(), CreateHabitParams {
            user_id: user.to_string(),
            name: name.to_string(),
            recurrence: "daily".to_string(),
            ..Default::default()
        })
        .unwrap();
        ids.push(response.habit_id);
    }

    engine.run_daily_pass(jan(2)).unwrap();
    for id in &ids {
        complete(&engine, id, jan(1));
    }
    complete(&engine, &ids[0], jan(2));

    engine.run_daily_pass(jan(3)).unwrap();

    let aggregate = engine.storage().get_user_streak(&user).unwrap();
    assert_eq!(aggregate.current_streak, 0);
    assert_eq!(aggregate.longest_streak, 0);

    let read = engine.storage().get_habit(&HabitId::from_string(&ids[0]).unwrap()).unwrap();
    assert_eq!(read.current_streak, 2);
}

#[test]
fn test_streaks_survive_reopen() {
    let dir = tempdir().unwrap();
    let user = UserId::new();
    let habit_id = {
        let engine = open_engine(&dir, jan(1));
        let response = create_habit(engine.storage(), engine.clock(), CreateHabitParams {
            user_id: user.to_string(),
            name: "Meditate".to_string(),
            recurrence: "täglich".to_string(),
            ..Default::default()
        })
        .unwrap();
        complete(&engine, &response.habit_id, jan(1));
        engine.run_daily_pass(jan(2)).unwrap();
        response.habit_id
    };

    let engine = open_engine(&dir, jan(2));
    let status = get_streak_status(engine.storage(), engine.clock(), StatusParams {
        user_id: user.to_string(),
        habit_id: Some(habit_id),
    })
    .unwrap();

    assert_eq!(status.habits[0].current_streak, 1);
    assert_eq!(status.habits[0].status, "active");
    assert_eq!(status.aggregate.current_streak, 1);
}

#[tokio::test]
async fn test_run_passes_on_startup_then_waits() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir, jan(5));
    let habit = HabitDefinition::new(UserId::new(), "Read".to_string(), None, RecurrenceRule::daily(jan(1))).unwrap();
    engine.storage().create_habit(&habit).unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(100), engine.run(true)).await;

    assert!(outcome.is_err(), "scheduler loop should still be waiting for midnight");
    assert!(engine.storage().find_entry(&habit.id, jan(5)).unwrap().is_some());
    assert_eq!(engine.storage().get_habit_streak(&habit.id).unwrap().as_of, Some(jan(5)));
    assert_eq!(engine.storage().get_user_streak(&habit.user_id).unwrap().as_of, Some(jan(5)));
}
