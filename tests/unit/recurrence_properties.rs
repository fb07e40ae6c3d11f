use habit_streak_engine::*;
use proptest::prelude::*;

fn base() -> CalendarDay {
    CalendarDay::from_ymd(2000, 1, 1).unwrap()
}

fn habit(rule: RecurrenceRule) -> HabitDefinition {
    HabitDefinition::new(UserId::new(), "Prop".to_string(), None, rule).unwrap()
}

proptest! {
    #[test]
    fn prop_daily_due_on_every_day_in_window(
        start_offset in 0..10_000i64,
        day_offset in 0..3_000i64,
        duration in proptest::option::of(1..400u32),
    ) {
        let start = base().add_days(start_offset);
        let mut rule = RecurrenceRule::daily(start);
        rule.duration_days = duration;
        let habit = habit(rule);
        let day = start.add_days(day_offset);

        let in_window = duration.map_or(true, |d| day_offset < i64::from(d));
        prop_assert_eq!(is_due(&habit, day), in_window);
    }

    #[test]
    fn prop_weekly_due_iff_weekday_selected(
        start_offset in 0..10_000i64,
        day_offset in 0..3_000i64,
        week_days in proptest::collection::btree_set(0..7u8, 1..=7),
    ) {
        let start = base().add_days(start_offset);
        let habit = habit(RecurrenceRule::weekly(start, week_days.iter().copied()));
        let day = start.add_days(day_offset);

        prop_assert_eq!(is_due(&habit, day), week_days.contains(&day.canonical_weekday()));
    }

    #[test]
    fn prop_never_due_before_start(
        start_offset in 1..10_000i64,
        back in 1..1_000i64,
        interval in 1..30u32,
    ) {
        let start = base().add_days(start_offset + 1_000);
        let day = start.add_days(-back);

        prop_assert!(!is_due(&habit(RecurrenceRule::daily(start)), day));
        prop_assert!(!is_due(&habit(RecurrenceRule::monthly(start)), day));
        prop_assert!(!is_due(&habit(RecurrenceRule::every_n_days(start, interval)), day));
    }

    #[test]
    fn prop_next_due_date_is_due(
        start_offset in 0..10_000i64,
        from_offset in 0..1_000i64,
        interval in 1..60u32,
    ) {
        let start = base().add_days(start_offset);
        let rule = RecurrenceRule::every_n_days(start, interval);
        let from = start.add_days(from_offset);

        let next = rule.next_due_date(from).unwrap();
        prop_assert!(next >= from);
        prop_assert!(rule.is_due_on(next));
        prop_assert!(next.days_since(from) < i64::from(interval));
    }
}

#[test]
fn test_monthly_clamps_to_short_months() {
    let habit = habit(RecurrenceRule::monthly(CalendarDay::from_ymd(2024, 1, 31).unwrap()));

    assert!(is_due(&habit, "2024-02-29"));
    assert!(!is_due(&habit, "2024-03-30"));
    assert!(is_due(&habit, "31.03.2024"));
    assert!(is_due(&habit, "2024-04-30"));
}

#[test]
fn test_interval_three() {
    let habit = habit(RecurrenceRule::every_n_days(CalendarDay::from_ymd(2024, 1, 1).unwrap(), 3));

    for due in [1, 4, 7] {
        assert!(is_due(&habit, CalendarDay::from_ymd(2024, 1, due).unwrap()));
    }
    for not_due in [2, 3, 5, 6] {
        assert!(!is_due(&habit, CalendarDay::from_ymd(2024, 1, not_due).unwrap()));
    }
}

#[test]
fn test_legacy_aliases_map_to_one_kind() {
    for alias in ["daily", "Täglich", "everyday"] {
        assert_eq!(alias.parse::<RecurrenceKind>().unwrap(), RecurrenceKind::Daily);
    }
    assert_eq!("wöchentlich".parse::<RecurrenceKind>().unwrap(), RecurrenceKind::Weekly);
    assert!("fortnightly".parse::<RecurrenceKind>().is_err());
}
