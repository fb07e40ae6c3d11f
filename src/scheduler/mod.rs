/// Tracking entry scheduling
///
/// `EntryScheduler` makes sure every habit due on a day has exactly one
/// tracking entry for it. It is safe to run repeatedly for the same day, and
/// concurrently with another pass: a uniqueness conflict from the store just
/// means someone else got there first.

pub mod daily;

pub use daily::*;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{is_due, CalendarDay, HabitDefinition, TrackingEntry};
use crate::storage::{HabitStorage, StorageError};

/// Outcome of one `ensure_entries` pass
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScheduleReport {
    /// Entries created by this pass
    pub created: Vec<TrackingEntry>,
    /// Habits not due on the day
    pub not_due: u32,
    /// Habits that already had an entry
    pub already_present: u32,
    /// Habits whose entry could not be created
    pub failures: u32,
}

/// Creates missing tracking entries for due habits
pub struct EntryScheduler<'a, S: HabitStorage + ?Sized> {
    storage: &'a S,
}

impl<'a, S: HabitStorage + ?Sized> EntryScheduler<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Ensure each due habit has an entry for `date`, returning the new ones
    pub fn ensure_entries_for_date(&self, habits: &[HabitDefinition], date: CalendarDay) -> Vec<TrackingEntry> {
        self.ensure_entries(habits, date).created
    }

    /// Same as `ensure_entries_for_date` but with per-habit bookkeeping
    ///
    /// A failure on one habit is logged and counted; the rest of the batch
    /// is still processed.
    pub fn ensure_entries(&self, habits: &[HabitDefinition], date: CalendarDay) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        for habit in habits {
            if !is_due(habit, date) {
                report.not_due += 1;
                continue;
            }

            match self.create_if_missing(habit, date) {
                Ok(Some(entry)) => report.created.push(entry),
                Ok(None) => report.already_present += 1,
                Err(e) => {
                    report.failures += 1;
                    warn!(habit_id = %habit.id, date = %date, unavailable = e.is_unavailable(), error = %e, "Failed to create tracking entry");
                }
            }
        }

        info!(
            date = %date,
            created = report.created.len(),
            already_present = report.already_present,
            not_due = report.not_due,
            failures = report.failures,
            "Ensured tracking entries"
        );

        report
    }

    /// Create today's entry for a single habit if it is due
    ///
    /// Used when a habit is created or its schedule is edited mid-day.
    /// Returns `None` when the habit is not due or already has the entry.
    pub fn seed_entry(&self, habit: &HabitDefinition, date: CalendarDay) -> Result<Option<TrackingEntry>, StorageError> {
        if !is_due(habit, date) {
            return Ok(None);
        }
        self.create_if_missing(habit, date)
    }

    fn create_if_missing(&self, habit: &HabitDefinition, date: CalendarDay) -> Result<Option<TrackingEntry>, StorageError> {
        if self.storage.find_entry(&habit.id, date)?.is_some() {
            debug!(habit_id = %habit.id, date = %date, "Entry already present");
            return Ok(None);
        }

        let entry = TrackingEntry::new(habit.id.clone(), habit.user_id.clone(), date);

        match self.storage.create_entry(&entry) {
            Ok(()) => Ok(Some(entry)),
            // Lost a race with another pass for the same day
            Err(e) if e.is_duplicate() => {
                debug!(habit_id = %habit.id, date = %date, "Entry created concurrently, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
