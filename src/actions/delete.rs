/// Deleting habits (cascades to their entries)

use serde::{Deserialize, Serialize};

use crate::actions::parse_habit_id;
use crate::storage::HabitStorage;
use crate::EngineError;

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteHabitParams {
    pub habit_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteHabitResponse {
    pub success: bool,
    pub entries_removed: usize,
    pub message: String,
}

pub fn delete_habit<S: HabitStorage + ?Sized>(
    storage: &S,
    params: DeleteHabitParams,
) -> Result<DeleteHabitResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let habit = storage.get_habit(&habit_id)?;
    let entries_removed = storage.delete_habit(&habit_id)?;

    tracing::info!(habit_id = %habit_id, entries_removed, "Deleted habit");

    Ok(DeleteHabitResponse {
        success: true,
        entries_removed,
        message: format!("🗑️ Deleted habit '{}' and {} tracking entries", habit.name, entries_removed),
    })
}
