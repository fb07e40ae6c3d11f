/// Streak calculation
///
/// A streak is the number of consecutive days, ending the day before "today",
/// on which the tracking entry was completed. Due-ness is implicit in entry
/// presence: the scheduler only files entries for due days, so a day without
/// an entry ends the scan just like an incomplete one.
///
/// Both the per-habit and the per-user aggregate computations share the same
/// backward scan and the same decay rule; they differ only in what makes a
/// day count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{CalendarDay, HabitDefinition, HabitId, TrackingEntry, UserId};

/// Current and longest streak for a habit or a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakCounts {
    pub current: u32,
    pub longest: u32,
}

impl StreakCounts {
    pub fn new(current: u32, longest: u32) -> Self {
        Self { current, longest }
    }

    /// Combine a freshly scanned count with the previously cached values
    ///
    /// A scan of zero against a positive cache decrements the cache by one
    /// instead of dropping to zero. Callers pass the counts cached for the
    /// previous day (see `StreakCache::prior_for`), so a lapsed streak winds
    /// down one day per calendar day.
    fn resolve(scanned: u32, prior: StreakCounts) -> Self {
        let current = if scanned == 0 && prior.current > 0 {
            prior.current - 1
        } else {
            scanned
        };

        Self {
            current,
            longest: prior.longest.max(current),
        }
    }
}

/// A persisted streak cache and the day it was computed for
///
/// `base` holds the counts the last computation resolved against. A second
/// refresh for the same day resolves against `base` again rather than its
/// own output, so the decay for a break is applied once per day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakCache {
    pub counts: StreakCounts,
    pub base: StreakCounts,
    /// None until a refresh has run, or after the cache was reset
    pub as_of: Option<CalendarDay>,
}

impl StreakCache {
    /// Cache not tied to a day; the next refresh resolves against `counts`
    pub fn unanchored(counts: StreakCounts) -> Self {
        Self {
            counts,
            base: counts,
            as_of: None,
        }
    }

    /// Result of a refresh as of `as_of` that resolved against `prior`
    pub fn computed(as_of: CalendarDay, prior: StreakCounts, counts: StreakCounts) -> Self {
        Self {
            counts,
            base: prior,
            as_of: Some(as_of),
        }
    }

    /// Counts a refresh as of `as_of` must resolve against
    ///
    /// `None` when the cache was already computed for a later day.
    pub fn prior_for(&self, as_of: CalendarDay) -> Option<StreakCounts> {
        match self.as_of {
            Some(cached) if cached > as_of => None,
            Some(cached) if cached == as_of => Some(self.base),
            _ => Some(self.counts),
        }
    }
}

/// Aggregate streak cache for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStreakState {
    pub user_id: UserId,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Counts the last refresh resolved against
    #[serde(default)]
    pub base: StreakCounts,
    /// Day the last refresh computed the streak for
    #[serde(default)]
    pub as_of: Option<CalendarDay>,
    /// When the nightly pass last wrote this state (None if never)
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserStreakState {
    /// Empty state for a user that has never been refreshed
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            base: StreakCounts::default(),
            as_of: None,
            updated_at: None,
        }
    }

    /// State holding `cache` for `user_id`, stamped now
    pub fn from_cache(user_id: UserId, cache: StreakCache) -> Self {
        Self {
            user_id,
            current_streak: cache.counts.current,
            longest_streak: cache.counts.longest,
            base: cache.base,
            as_of: cache.as_of,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn counts(&self) -> StreakCounts {
        StreakCounts::new(self.current_streak, self.longest_streak)
    }

    pub fn cache(&self) -> StreakCache {
        StreakCache {
            counts: self.counts(),
            base: self.base,
            as_of: self.as_of,
        }
    }
}

/// Walk backward from the day before `as_of`, counting days that qualify
///
/// `qualifies` must return false for any day with no data, which bounds the
/// walk by the history it is given.
fn scan_backward<F>(as_of: CalendarDay, qualifies: F) -> u32
where
    F: Fn(CalendarDay) -> bool,
{
    let mut count = 0;
    let mut day = as_of.pred();

    while qualifies(day) {
        count += 1;
        day = day.pred();
    }

    count
}

/// Compute a habit's current and longest streak as of `as_of`
///
/// Entries belonging to other habits are ignored, as is the entry for `as_of`
/// itself since that day is still in progress.
pub fn compute_habit_streak(
    habit_id: &HabitId,
    history: &[TrackingEntry],
    prior: StreakCounts,
    as_of: CalendarDay,
) -> StreakCounts {
    let mut completed_by_day: HashMap<CalendarDay, bool> = HashMap::new();

    for entry in history.iter().filter(|e| &e.habit_id == habit_id && e.date < as_of) {
        completed_by_day
            .entry(entry.date)
            .and_modify(|done| *done &= entry.completed)
            .or_insert(entry.completed);
    }

    let scanned = scan_backward(as_of, |day| completed_by_day.get(&day).copied().unwrap_or(false));

    StreakCounts::resolve(scanned, prior)
}

/// Compute a user's aggregate streak across all of their habits
///
/// A day counts only if at least one habit was due (had an entry) and every
/// habit due that day was completed. A day on which nothing was due ends the
/// streak.
pub fn compute_aggregate_streak(
    user_id: &UserId,
    history: &[TrackingEntry],
    prior: StreakCounts,
    as_of: CalendarDay,
) -> StreakCounts {
    // (due, completed) per day
    let mut tally: HashMap<CalendarDay, (u32, u32)> = HashMap::new();

    for entry in history.iter().filter(|e| &e.user_id == user_id && e.date < as_of) {
        let counts = tally.entry(entry.date).or_insert((0, 0));
        counts.0 += 1;
        if entry.completed {
            counts.1 += 1;
        }
    }

    let scanned = scan_backward(as_of, |day| match tally.get(&day) {
        Some((due, completed)) => *due > 0 && completed == due,
        None => false,
    });

    StreakCounts::resolve(scanned, prior)
}

/// Percentage (0-100) of recorded days before `as_of` that were completed
///
/// Returns 0 when nothing has been recorded yet.
pub fn completion_percentage(habit_id: &HabitId, history: &[TrackingEntry], as_of: CalendarDay) -> f64 {
    let (recorded, completed) = history
        .iter()
        .filter(|e| &e.habit_id == habit_id && e.date < as_of)
        .fold((0u32, 0u32), |(recorded, completed), e| {
            (recorded + 1, completed + u32::from(e.completed))
        });

    if recorded == 0 {
        return 0.0;
    }

    f64::from(completed) * 100.0 / f64::from(recorded)
}

/// Read model describing a habit's streak for presentation
///
/// Current and longest come from the habit's persisted cache so every reader
/// sees the value written by the nightly pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub habit_id: HabitId,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Number of completed entries ever recorded
    pub total_completions: u32,
    /// Completed share of recorded days before "today" (0-100)
    pub completion_percentage: f64,
    /// Most recent completed day (None if never completed)
    pub last_completed: Option<CalendarDay>,
}

impl StreakSummary {
    pub fn from_history(habit: &HabitDefinition, history: &[TrackingEntry], as_of: CalendarDay) -> Self {
        let completed_days: Vec<CalendarDay> = history
            .iter()
            .filter(|e| e.habit_id == habit.id && e.completed)
            .map(|e| e.date)
            .collect();

        Self {
            habit_id: habit.id.clone(),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            total_completions: completed_days.len() as u32,
            completion_percentage: completion_percentage(&habit.id, history, as_of),
            last_completed: completed_days.iter().max().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(day: u32) -> CalendarDay {
        CalendarDay::from_ymd(2024, 1, day).unwrap()
    }

    fn entry(habit_id: &HabitId, user_id: &UserId, date: CalendarDay, completed: bool) -> TrackingEntry {
        let mut e = TrackingEntry::new(habit_id.clone(), user_id.clone(), date);
        e.completed = completed;
        e
    }

    #[test]
    fn test_three_completed_days_before_today() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history: Vec<_> = (7..=9).map(|d| entry(&habit, &user, jan(d), true)).collect();

        let streak = compute_habit_streak(&habit, &history, StreakCounts::default(), jan(10));

        assert_eq!(streak, StreakCounts::new(3, 3));
    }

    #[test]
    fn test_today_is_never_counted() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history = vec![
            entry(&habit, &user, jan(9), true),
            entry(&habit, &user, jan(10), true),
        ];

        let streak = compute_habit_streak(&habit, &history, StreakCounts::default(), jan(10));
        assert_eq!(streak.current, 1);
    }

    #[test]
    fn test_incomplete_yesterday_without_cache_is_zero() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history = vec![
            entry(&habit, &user, jan(8), true),
            entry(&habit, &user, jan(9), false),
        ];

        let streak = compute_habit_streak(&habit, &history, StreakCounts::default(), jan(10));
        assert_eq!(streak, StreakCounts::new(0, 0));
    }

    #[test]
    fn test_break_decays_cached_streak_by_one() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history = vec![entry(&habit, &user, jan(9), false)];

        let streak = compute_habit_streak(&habit, &history, StreakCounts::new(5, 8), jan(10));
        assert_eq!(streak, StreakCounts::new(4, 8));

        // Next run sees the decayed cache and the scan is still zero
        let next = compute_habit_streak(&habit, &history, streak, jan(11));
        assert_eq!(next, StreakCounts::new(3, 8));
    }

    #[test]
    fn test_missing_entry_breaks_like_incomplete() {
        let habit = HabitId::new();
        let user = UserId::new();
        // Gap on the 8th
        let history = vec![
            entry(&habit, &user, jan(6), true),
            entry(&habit, &user, jan(7), true),
            entry(&habit, &user, jan(9), true),
        ];

        let streak = compute_habit_streak(&habit, &history, StreakCounts::default(), jan(10));
        assert_eq!(streak.current, 1);
    }

    #[test]
    fn test_read_habit_worked_example() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history: Vec<_> = (1..=10)
            .map(|d| entry(&habit, &user, jan(d), d != 7))
            .collect();

        let streak = compute_habit_streak(&habit, &history, StreakCounts::new(0, 6), jan(11));
        assert_eq!(streak, StreakCounts::new(3, 6));

        let streak = compute_habit_streak(&habit, &history, StreakCounts::new(0, 2), jan(11));
        assert_eq!(streak, StreakCounts::new(3, 3));
    }

    #[test]
    fn test_other_habits_ignored() {
        let habit = HabitId::new();
        let other = HabitId::new();
        let user = UserId::new();
        let history = vec![
            entry(&other, &user, jan(9), true),
            entry(&habit, &user, jan(8), true),
        ];

        let streak = compute_habit_streak(&habit, &history, StreakCounts::default(), jan(10));
        assert_eq!(streak.current, 0);
    }

    #[test]
    fn test_aggregate_requires_every_due_habit() {
        let user = UserId::new();
        let a = HabitId::new();
        let b = HabitId::new();
        let history = vec![
            entry(&a, &user, jan(8), true),
            entry(&b, &user, jan(8), true),
            // B due but not done on the 9th
            entry(&a, &user, jan(9), true),
            entry(&b, &user, jan(9), false),
        ];

        let streak = compute_aggregate_streak(&user, &history, StreakCounts::default(), jan(10));
        assert_eq!(streak.current, 0);

        let streak = compute_aggregate_streak(&user, &history, StreakCounts::default(), jan(9));
        assert_eq!(streak.current, 1);
    }

    #[test]
    fn test_aggregate_counts_days_with_different_habits_due() {
        let user = UserId::new();
        let a = HabitId::new();
        let b = HabitId::new();
        let history = vec![
            entry(&a, &user, jan(7), true),
            entry(&b, &user, jan(8), true),
            entry(&a, &user, jan(9), true),
            entry(&b, &user, jan(9), true),
        ];

        let streak = compute_aggregate_streak(&user, &history, StreakCounts::default(), jan(10));
        assert_eq!(streak.current, 3);
    }

    #[test]
    fn test_aggregate_empty_day_is_a_break() {
        let user = UserId::new();
        let a = HabitId::new();
        let history = vec![
            entry(&a, &user, jan(7), true),
            entry(&a, &user, jan(9), true),
        ];

        let streak = compute_aggregate_streak(&user, &history, StreakCounts::new(0, 4), jan(10));
        assert_eq!(streak, StreakCounts::new(1, 4));
    }

    #[test]
    fn test_completion_percentage() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history = vec![
            entry(&habit, &user, jan(1), true),
            entry(&habit, &user, jan(2), false),
            entry(&habit, &user, jan(3), true),
            entry(&habit, &user, jan(4), true),
            // today, excluded
            entry(&habit, &user, jan(5), false),
        ];

        assert_eq!(completion_percentage(&habit, &history, jan(5)), 75.0);
        assert_eq!(completion_percentage(&HabitId::new(), &history, jan(5)), 0.0);
    }

    #[test]
    fn test_cache_prior_depends_on_computed_day() {
        let fresh = StreakCache::unanchored(StreakCounts::new(5, 5));
        assert_eq!(fresh.prior_for(jan(10)), Some(StreakCounts::new(5, 5)));

        let cache = StreakCache::computed(jan(10), StreakCounts::new(5, 5), StreakCounts::new(4, 5));
        // Same day resolves against the base, not its own output
        assert_eq!(cache.prior_for(jan(10)), Some(StreakCounts::new(5, 5)));
        assert_eq!(cache.prior_for(jan(11)), Some(StreakCounts::new(4, 5)));
        assert_eq!(cache.prior_for(jan(9)), None);
    }

    #[test]
    fn test_same_day_recompute_decays_once() {
        let habit = HabitId::new();
        let user = UserId::new();
        let history = vec![entry(&habit, &user, jan(9), false)];

        let mut cache = StreakCache::unanchored(StreakCounts::new(5, 5));
        for _ in 0..3 {
            let prior = cache.prior_for(jan(10)).unwrap();
            let counts = compute_habit_streak(&habit, &history, prior, jan(10));
            cache = StreakCache::computed(jan(10), prior, counts);
        }

        assert_eq!(cache.counts, StreakCounts::new(4, 5));
    }
}
