/// TrackingEntry entity
///
/// This module defines the TrackingEntry struct: one habit's completion
/// status for exactly one calendar day. Entries are created incomplete by the
/// scheduler and flipped by the user.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{CalendarDay, DomainError, EntryId, HabitId, UserId};

/// A habit's completion record for a single due day
///
/// At most one entry exists per `(habit_id, date)`; the storage layer
/// enforces this with a unique index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Unique identifier for this entry
    pub id: EntryId,
    /// Which habit this entry is for
    pub habit_id: HabitId,
    /// Owner of the habit
    pub user_id: UserId,
    /// The day this entry is filed under
    pub date: CalendarDay,
    /// Whether the user completed the habit that day
    pub completed: bool,
    /// User's notes about this day
    pub note: Option<String>,
    /// When this entry was created
    pub created_at: DateTime<Utc>,
}

impl TrackingEntry {
    /// Create a fresh, incomplete entry for a due day
    pub fn new(habit_id: HabitId, user_id: UserId, date: CalendarDay) -> Self {
        Self {
            id: EntryId::new(),
            habit_id,
            user_id,
            date,
            completed: false,
            note: None,
            created_at: Utc::now(),
        }
    }

    /// Create an entry from existing data (used when loading from database)
    pub fn from_existing(
        id: EntryId,
        habit_id: HabitId,
        user_id: UserId,
        date: CalendarDay,
        completed: bool,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            habit_id,
            user_id,
            date,
            completed,
            note,
            created_at,
        }
    }

    /// Flip the completion flag, returning the new value
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Replace the note, validating its length
    pub fn set_note(&mut self, note: Option<String>) -> Result<(), DomainError> {
        Self::validate_note(&note)?;
        self.note = note.filter(|text| !text.trim().is_empty());
        Ok(())
    }

    /// Check if this entry has notes
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|text| !text.trim().is_empty())
    }

    /// Validate the optional note field
    pub fn validate_note(note: &Option<String>) -> Result<(), DomainError> {
        if let Some(text) = note {
            if text.chars().count() > 500 {
                return Err(DomainError::InvalidValue {
                    message: "Notes cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }
}
