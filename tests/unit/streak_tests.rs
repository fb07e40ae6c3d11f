use habit_streak_engine::*;
use proptest::prelude::*;

fn jan(day: u32) -> CalendarDay {
    CalendarDay::from_ymd(2024, 1, day).unwrap()
}

fn entry(habit_id: &HabitId, user_id: &UserId, date: CalendarDay, completed: bool) -> TrackingEntry {
    let mut entry = TrackingEntry::new(habit_id.clone(), user_id.clone(), date);
    entry.completed = completed;
    entry
}

proptest! {
    #[test]
    fn prop_fresh_streak_is_trailing_completed_run(flags in proptest::collection::vec(any::<bool>(), 0..60)) {
        let habit_id = HabitId::new();
        let user_id = UserId::new();
        let as_of = CalendarDay::from_ymd(2024, 6, 1).unwrap();

        // flags[0] is yesterday, flags[1] the day before, ...
        let history: Vec<TrackingEntry> = flags
            .iter()
            .enumerate()
            .map(|(i, done)| entry(&habit_id, &user_id, as_of.add_days(-(i as i64) - 1), *done))
            .collect();

        let expected = flags.iter().take_while(|done| **done).count() as u32;
        let counts = compute_habit_streak(&habit_id, &history, StreakCounts::default(), as_of);

        prop_assert_eq!(counts.current, expected);
        prop_assert_eq!(counts.longest, expected);
    }

    #[test]
    fn prop_longest_never_decreases(prior_current in 0..200u32, extra in 0..200u32, done_yesterday in any::<bool>()) {
        let habit_id = HabitId::new();
        let user_id = UserId::new();
        let as_of = jan(20);
        let prior = StreakCounts::new(prior_current, prior_current + extra);
        let history = vec![entry(&habit_id, &user_id, jan(19), done_yesterday)];

        let counts = compute_habit_streak(&habit_id, &history, prior, as_of);

        prop_assert!(counts.longest >= prior.longest);
        prop_assert!(counts.longest >= counts.current);
    }
}

#[test]
fn test_worked_read_scenario() {
    let user_id = UserId::new();
    let rule = RecurrenceRule::daily(jan(1)).with_duration(10);
    let habit = HabitDefinition::new(user_id.clone(), "Read".to_string(), None, rule).unwrap();

    let history: Vec<TrackingEntry> = (1..=10)
        .map(|d| entry(&habit.id, &user_id, jan(d), d != 7))
        .collect();

    let fresh = compute_habit_streak(&habit.id, &history, StreakCounts::default(), jan(11));
    assert_eq!(fresh, StreakCounts::new(3, 3));

    let with_history = compute_habit_streak(&habit.id, &history, StreakCounts::new(9, 12), jan(11));
    assert_eq!(with_history, StreakCounts::new(3, 12));
}

#[test]
fn test_incomplete_yesterday_decays_prior() {
    let habit_id = HabitId::new();
    let user_id = UserId::new();
    let history = vec![entry(&habit_id, &user_id, jan(9), false)];

    assert_eq!(compute_habit_streak(&habit_id, &history, StreakCounts::new(0, 4), jan(10)).current, 0);
    assert_eq!(compute_habit_streak(&habit_id, &history, StreakCounts::new(5, 8), jan(10)), StreakCounts::new(4, 8));
}

#[test]
fn test_aggregate_skips_partially_completed_day() {
    let user_id = UserId::new();
    let a = HabitId::new();
    let b = HabitId::new();
    let history = vec![
        entry(&a, &user_id, jan(9), true),
        entry(&b, &user_id, jan(9), true),
        entry(&a, &user_id, jan(8), true),
        entry(&b, &user_id, jan(8), false),
        entry(&a, &user_id, jan(7), true),
    ];

    let counts = compute_aggregate_streak(&user_id, &history, StreakCounts::default(), jan(10));
    assert_eq!(counts.current, 1);
}

#[test]
fn test_summary_reads_cache_and_history() {
    let user_id = UserId::new();
    let mut habit = HabitDefinition::new(user_id.clone(), "Walk".to_string(), None, RecurrenceRule::daily(jan(1))).unwrap();
    habit.set_streak_cache(2, 5);
    let history = vec![
        entry(&habit.id, &user_id, jan(1), true),
        entry(&habit.id, &user_id, jan(2), false),
        entry(&habit.id, &user_id, jan(3), true),
        entry(&habit.id, &user_id, jan(4), true),
    ];

    let summary = StreakSummary::from_history(&habit, &history, jan(4));

    assert_eq!(summary.current_streak, 2);
    assert_eq!(summary.longest_streak, 5);
    assert_eq!(summary.total_completions, 3);
    // Today's entry is excluded from the percentage
    assert!((summary.completion_percentage - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.last_completed, Some(jan(4)));
}
