use habit_streak_engine::*;

#[test]
fn test_classify_thresholds() {
    assert_eq!(classify(3), MilestoneTier::DayCount);
    assert_eq!(classify(7), MilestoneTier::Week);
    assert_eq!(classify(30), MilestoneTier::Month);
    assert_eq!(classify(100), MilestoneTier::Legend);
    assert_eq!(classify(u32::MAX), MilestoneTier::Legend);
}

#[test]
fn test_messages_mention_streak_length() {
    assert!(classify(3).message(3).contains('3'));
    assert!(classify(42).message(42).contains("42"));
    assert!(classify(0).message(0).contains("Ready to start"));
}

#[test]
fn test_growth_stage_bands_and_clamping() {
    let stages: Vec<u8> = [0.0, 19.9, 20.0, 45.0, 60.0, 79.9, 80.0, 100.0]
        .into_iter()
        .map(growth_stage)
        .collect();
    assert_eq!(stages, vec![1, 1, 2, 3, 4, 4, 5, 5]);

    assert_eq!(growth_stage(-5.0), 1);
    assert_eq!(growth_stage(250.0), 5);
    assert_eq!(growth_stage(f64::NAN), 1);
}

#[test]
fn test_highest_milestone() {
    assert_eq!(highest_milestone(6), None);
    assert_eq!(highest_milestone(WEEK_MILESTONE), Some(7));
    assert_eq!(highest_milestone(99), Some(MONTH_MILESTONE));
    assert_eq!(highest_milestone(365), Some(LEGEND_MILESTONE));
}
