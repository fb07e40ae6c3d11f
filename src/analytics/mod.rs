/// Nightly streak recomputation
///
/// Recomputes and persists every habit's streak cache and every user's
/// aggregate streak. Users are processed independently; within a user each
/// habit's cache is disjoint, so the order habits are visited in does not
/// matter. A failure on one habit or user is logged and the pass continues.
///
/// Each cache remembers the day it was computed for. Refreshing the same day
/// again resolves against the counts from before that day, and a refresh for
/// a day older than the cache is skipped, so repeated passes are harmless.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::{
    compute_aggregate_streak, compute_habit_streak, CalendarDay, HabitDefinition, StreakCache,
    StreakCounts, UserId, UserStreakState,
};
use crate::storage::{HabitStorage, StorageError};

/// Totals for one refresh pass
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub users_refreshed: u32,
    pub habits_refreshed: u32,
    /// Caches already computed for a later day, left untouched
    pub skipped: u32,
    pub failures: u32,
}

impl RefreshReport {
    fn absorb(&mut self, other: RefreshReport) {
        self.users_refreshed += other.users_refreshed;
        self.habits_refreshed += other.habits_refreshed;
        self.skipped += other.skipped;
        self.failures += other.failures;
    }
}

/// Recomputes streak caches from stored tracking entries
pub struct StreakRefresher<'a, S: HabitStorage + ?Sized> {
    storage: &'a S,
}

impl<'a, S: HabitStorage + ?Sized> StreakRefresher<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Compute a habit's streak as of `as_of` against `prior` without persisting it
    pub fn compute_habit(
        &self,
        habit: &HabitDefinition,
        prior: StreakCounts,
        as_of: CalendarDay,
    ) -> Result<StreakCounts, StorageError> {
        let history = self
            .storage
            .get_entries_for_habit(&habit.id, habit.recurrence.start_date, as_of.pred())?;

        Ok(compute_habit_streak(&habit.id, &history, prior, as_of))
    }

    /// Recompute and persist one habit's streak cache
    ///
    /// Returns `None` without writing when the cache was already computed for
    /// a later day.
    pub fn refresh_habit(&self, habit: &HabitDefinition, as_of: CalendarDay) -> Result<Option<StreakCounts>, StorageError> {
        let cache = self.storage.get_habit_streak(&habit.id)?;
        let prior = match cache.prior_for(as_of) {
            Some(prior) => prior,
            None => {
                debug!(habit_id = %habit.id, cached_as_of = ?cache.as_of, "Habit streak cache is newer, skipping");
                return Ok(None);
            }
        };

        let counts = self.compute_habit(habit, prior, as_of)?;
        self.storage
            .update_habit_streak(&habit.id, &StreakCache::computed(as_of, prior, counts))?;

        debug!(
            habit_id = %habit.id,
            current = counts.current,
            longest = counts.longest,
            "Refreshed habit streak"
        );
        Ok(Some(counts))
    }

    /// Compute a user's aggregate streak as of `as_of` against `prior` without persisting it
    pub fn compute_user(
        &self,
        user_id: &UserId,
        habits: &[HabitDefinition],
        prior: StreakCounts,
        as_of: CalendarDay,
    ) -> Result<StreakCounts, StorageError> {
        let history = match habits.iter().map(|h| h.recurrence.start_date).min() {
            Some(earliest) => self.storage.get_entries_for_user(user_id, earliest, as_of.pred())?,
            None => Vec::new(),
        };

        Ok(compute_aggregate_streak(user_id, &history, prior, as_of))
    }

    /// Recompute and persist a user's aggregate streak
    ///
    /// Returns `None` without writing when the cache was already computed for
    /// a later day.
    fn refresh_aggregate(
        &self,
        user_id: &UserId,
        habits: &[HabitDefinition],
        as_of: CalendarDay,
    ) -> Result<Option<UserStreakState>, StorageError> {
        let cache = self.storage.get_user_streak(user_id)?.cache();
        let prior = match cache.prior_for(as_of) {
            Some(prior) => prior,
            None => {
                debug!(user_id = %user_id, cached_as_of = ?cache.as_of, "Aggregate streak cache is newer, skipping");
                return Ok(None);
            }
        };

        let counts = self.compute_user(user_id, habits, prior, as_of)?;
        let state = UserStreakState::from_cache(user_id.clone(), StreakCache::computed(as_of, prior, counts));
        self.storage.save_user_streak(&state)?;

        debug!(
            user_id = %user_id,
            current = state.current_streak,
            longest = state.longest_streak,
            "Refreshed aggregate streak"
        );
        Ok(Some(state))
    }

    /// Refresh every habit of one user, then the user's aggregate
    ///
    /// Only listing the user's habits can fail the call; per-habit and
    /// aggregate failures are logged and counted in the report.
    pub fn refresh_user(&self, user_id: &UserId, as_of: CalendarDay) -> Result<RefreshReport, StorageError> {
        let habits = self.storage.list_habits(Some(user_id))?;
        let mut report = RefreshReport::default();

        for habit in &habits {
            match self.refresh_habit(habit, as_of) {
                Ok(Some(_)) => report.habits_refreshed += 1,
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    report.failures += 1;
                    warn!(
                        habit_id = %habit.id,
                        unavailable = e.is_unavailable(),
                        error = %e,
                        "Failed to refresh habit streak"
                    );
                }
            }
        }

        match self.refresh_aggregate(user_id, &habits, as_of) {
            Ok(Some(_)) => report.users_refreshed += 1,
            Ok(None) => report.skipped += 1,
            Err(e) => {
                report.failures += 1;
                error!(
                    user_id = %user_id,
                    unavailable = e.is_unavailable(),
                    error = %e,
                    "Failed to refresh aggregate streak"
                );
            }
        }

        Ok(report)
    }

    /// Refresh every user known to the store
    pub fn refresh_all(&self, as_of: CalendarDay) -> Result<RefreshReport, StorageError> {
        let users = self.storage.list_user_ids()?;
        let mut report = RefreshReport::default();

        for user_id in &users {
            match self.refresh_user(user_id, as_of) {
                Ok(user_report) => report.absorb(user_report),
                Err(e) => {
                    report.failures += 1;
                    error!(
                        user_id = %user_id,
                        unavailable = e.is_unavailable(),
                        error = %e,
                        "Failed to refresh streaks for user"
                    );
                }
            }
        }

        info!(
            as_of = %as_of,
            users = report.users_refreshed,
            habits = report.habits_refreshed,
            skipped = report.skipped,
            failures = report.failures,
            "Streak refresh complete"
        );
        Ok(report)
    }
}
