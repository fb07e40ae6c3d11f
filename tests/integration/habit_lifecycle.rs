use std::sync::Arc;

use habit_streak_engine::actions::*;
use habit_streak_engine::*;
use tempfile::NamedTempFile;

fn jan(day: u32) -> CalendarDay {
    CalendarDay::from_ymd(2024, 1, day).unwrap()
}

#[test]
fn test_edit_schedule_purges_history_and_reseeds_today() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStorage::new(temp_file.path().to_path_buf()).expect("Failed to create storage");
    let engine = HabitEngine::with_parts(storage, Arc::new(FixedClock(jan(1))));
    let user = UserId::new();

    let created = create_habit(engine.storage(), engine.clock(), CreateHabitParams {
        user_id: user.to_string(),
        name: "Stretch".to_string(),
        recurrence: "daily".to_string(),
        ..Default::default()
    })
    .unwrap();
    for day in 2..=4 {
        engine.run_daily_pass(jan(day)).unwrap();
    }
    let habit_id = HabitId::from_string(&created.habit_id).unwrap();
    assert_eq!(engine.storage().get_entries_for_habit(&habit_id, jan(1), jan(4)).unwrap().len(), 4);

    // Thursday the 4th: switch to Tuesdays and Thursdays
    let updated = update_habit(engine.storage(), &FixedClock(jan(4)), UpdateHabitParams {
        habit_id: created.habit_id.clone(),
        recurrence: Some("weekly".to_string()),
        week_days: Some(vec![3, 1]),
        ..Default::default()
    })
    .unwrap();

    assert!(updated.schedule_changed);
    assert_eq!(updated.entries_purged, 4);
    let remaining = engine.storage().get_entries_for_habit(&habit_id, jan(1), jan(31)).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(Some(remaining[0].id.to_string()), updated.today_entry_id);

    let stored = engine.storage().get_habit(&habit_id).unwrap();
    assert_eq!(stored.recurrence.week_days, vec![1, 3]);

    // Friday is not due under the new rule
    let friday = engine.reconcile(jan(5)).unwrap();
    assert!(friday.created.is_empty());
}

#[test]
fn test_list_toggle_and_delete() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStorage::new(temp_file.path().to_path_buf()).expect("Failed to create storage");
    let clock = FixedClock(jan(10));
    let user = UserId::new();

    let created = create_habit(&storage, &clock, CreateHabitParams {
        user_id: user.to_string(),
        name: "Budget review".to_string(),
        recurrence: "monthly".to_string(),
        start_date: Some("10.01.2024".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert!(created.due_today);

    let listed = list_habits(&storage, &clock, ListHabitsParams {
        user_id: Some(user.to_string()),
        date: None,
    })
    .unwrap();
    assert_eq!(listed.habits[0].recurrence, "monthly on day 10");
    assert!(listed.habits[0].due_on_date);

    let toggled = toggle_entry(&storage, &clock, ToggleEntryParams {
        entry_id: created.today_entry_id.clone(),
        note: Some("Spent less on takeout".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert!(toggled.completed);
    assert_eq!(toggled.date, "2024-01-10");

    let deleted = delete_habit(&storage, DeleteHabitParams { habit_id: created.habit_id.clone() }).unwrap();
    assert_eq!(deleted.entries_removed, 1);

    let missing_entry = toggle_entry(&storage, &clock, ToggleEntryParams {
        entry_id: created.today_entry_id,
        ..Default::default()
    });
    assert!(missing_entry.unwrap_err().is_not_found());
    assert!(storage.list_habits(Some(&user)).unwrap().is_empty());
}

#[test]
fn test_duplicate_entry_is_rejected_by_store() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStorage::new(temp_file.path().to_path_buf()).expect("Failed to create storage");
    let habit = HabitDefinition::new(UserId::new(), "Water".to_string(), None, RecurrenceRule::daily(jan(1))).unwrap();
    storage.create_habit(&habit).unwrap();

    storage.create_entry(&TrackingEntry::new(habit.id.clone(), habit.user_id.clone(), jan(1))).unwrap();
    let duplicate = storage.create_entry(&TrackingEntry::new(habit.id.clone(), habit.user_id.clone(), jan(1)));

    assert!(duplicate.unwrap_err().is_duplicate());

    let scheduled = EntryScheduler::new(&storage).ensure_entries_for_date(&[habit], jan(1));
    assert!(scheduled.is_empty());
}
