/// Storage layer for persisting habit data
///
/// The engine only talks to the `HabitStorage` trait; SQLite is the adapter
/// shipped with the crate. Tests and the binary both go through the same
/// interface.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use thiserror::Error;
use crate::domain::{
    CalendarDay, EntryId, HabitDefinition, HabitId, StreakCache, TrackingEntry, UserId,
    UserStreakState,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    #[error("Duplicate entry: habit {habit_id} already has an entry for {date}")]
    DuplicateEntry { habit_id: String, date: String },

    #[error("Corrupt row {id}: {reason}")]
    CorruptRow { id: String, reason: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// A `(habit_id, date)` uniqueness conflict, benign for the scheduler
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::DuplicateEntry { .. })
    }

    /// The referenced habit or entry does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::HabitNotFound { .. } | StorageError::EntryNotFound { .. })
    }

    /// The store itself failed; the next scheduled run retries implicitly
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StorageError::Connection(_) | StorageError::Query(_) | StorageError::Migration(_)
        )
    }
}

/// Trait defining the storage interface for habits and tracking entries
///
/// Date ranges are inclusive on both ends.
pub trait HabitStorage {
    /// Create a new habit
    fn create_habit(&self, habit: &HabitDefinition) -> Result<(), StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<HabitDefinition, StorageError>;

    /// Update an existing habit's definition (the streak cache is left alone)
    fn update_habit(&self, habit: &HabitDefinition) -> Result<(), StorageError>;

    /// Delete a habit together with all of its entries
    ///
    /// Returns the number of entries removed.
    fn delete_habit(&self, habit_id: &HabitId) -> Result<usize, StorageError>;

    /// List habits, optionally scoped to a single user
    ///
    /// Rows that can no longer be interpreted are skipped and logged.
    fn list_habits(&self, user_id: Option<&UserId>) -> Result<Vec<HabitDefinition>, StorageError>;

    /// A habit's streak cache together with the day it was computed for
    fn get_habit_streak(&self, habit_id: &HabitId) -> Result<StreakCache, StorageError>;

    /// Overwrite a habit's streak cache
    fn update_habit_streak(&self, habit_id: &HabitId, cache: &StreakCache) -> Result<(), StorageError>;

    /// Every user owning at least one habit
    fn list_user_ids(&self) -> Result<Vec<UserId>, StorageError>;

    /// Create a new tracking entry
    ///
    /// Fails with `DuplicateEntry` if the habit already has an entry that day.
    fn create_entry(&self, entry: &TrackingEntry) -> Result<(), StorageError>;

    /// Get an entry by ID
    fn get_entry(&self, entry_id: &EntryId) -> Result<TrackingEntry, StorageError>;

    /// The entry for a habit on a given day, if any
    fn find_entry(&self, habit_id: &HabitId, date: CalendarDay) -> Result<Option<TrackingEntry>, StorageError>;

    /// Entries for a habit within a date range, newest first
    fn get_entries_for_habit(
        &self,
        habit_id: &HabitId,
        from: CalendarDay,
        to: CalendarDay,
    ) -> Result<Vec<TrackingEntry>, StorageError>;

    /// All of a user's entries filed under one day
    fn get_entries_for_user_on(&self, user_id: &UserId, date: CalendarDay) -> Result<Vec<TrackingEntry>, StorageError>;

    /// All of a user's entries within a date range, newest first
    fn get_entries_for_user(
        &self,
        user_id: &UserId,
        from: CalendarDay,
        to: CalendarDay,
    ) -> Result<Vec<TrackingEntry>, StorageError>;

    /// Persist an entry's completed flag and note
    fn update_entry(&self, entry: &TrackingEntry) -> Result<(), StorageError>;

    /// Delete every entry of a habit, returning how many were removed
    fn delete_entries_for_habit(&self, habit_id: &HabitId) -> Result<usize, StorageError>;

    /// Aggregate streak cache for a user (zeroed if never written)
    fn get_user_streak(&self, user_id: &UserId) -> Result<UserStreakState, StorageError>;

    /// Overwrite a user's aggregate streak cache
    fn save_user_streak(&self, state: &UserStreakState) -> Result<(), StorageError>;
}
