/// Toggling tracking entries
///
/// The only mutation a user makes to an entry: flip its completed flag and
/// optionally attach a note. Entries are addressed by id, or by habit and day
/// (defaulting to today).

use serde::{Deserialize, Serialize};

use crate::actions::{parse_day_or_today, parse_entry_id, parse_habit_id};
use crate::clock::Clock;
use crate::storage::{HabitStorage, StorageError};
use crate::EngineError;

/// Parameters for toggling an entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleEntryParams {
    pub entry_id: Option<String>,
    pub habit_id: Option<String>,
    pub date: Option<String>, // used with habit_id, defaults to today
    pub note: Option<String>,
}

/// Response from toggling an entry
#[derive(Debug, Serialize)]
pub struct ToggleEntryResponse {
    pub success: bool,
    pub entry_id: String,
    pub date: String,
    pub completed: bool,
    pub message: String,
}

pub fn toggle_entry<S: HabitStorage + ?Sized>(
    storage: &S,
    clock: &dyn Clock,
    params: ToggleEntryParams,
) -> Result<ToggleEntryResponse, EngineError> {
    let mut entry = match (&params.entry_id, &params.habit_id) {
        (Some(raw_id), _) => storage.get_entry(&parse_entry_id(raw_id)?)?,
        (None, Some(raw_habit)) => {
            let habit_id = parse_habit_id(raw_habit)?;
            let date = parse_day_or_today(params.date.as_deref(), clock)?;
            storage
                .find_entry(&habit_id, date)?
                .ok_or_else(|| StorageError::EntryNotFound {
                    entry_id: format!("habit {} on {}", habit_id, date),
                })?
        }
        (None, None) => {
            return Err(EngineError::InvalidInput(
                "Either entry_id or habit_id must be provided".to_string(),
            ));
        }
    };

    let completed = entry.toggle();
    if params.note.is_some() {
        entry.set_note(params.note)?;
    }
    storage.update_entry(&entry)?;

    tracing::debug!(entry_id = %entry.id, completed, "Toggled tracking entry");

    let message = if completed {
        format!("🔥 Marked {} as done!", entry.date)
    } else {
        format!("↩️ Marked {} as not done", entry.date)
    };

    Ok(ToggleEntryResponse {
        success: true,
        entry_id: entry.id.to_string(),
        date: entry.date.to_string(),
        completed,
        message,
    })
}
