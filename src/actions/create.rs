/// Creating habits
///
/// Validates the request, stores the habit, and files today's entry right
/// away if the new habit is already due today.

use serde::{Deserialize, Serialize};

use crate::actions::{parse_day_or_today, parse_user_id};
use crate::clock::Clock;
use crate::domain::{HabitDefinition, RecurrenceKind, RecurrenceRule};
use crate::scheduler::EntryScheduler;
use crate::storage::HabitStorage;
use crate::EngineError;

/// Parameters for creating a new habit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateHabitParams {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub recurrence: String, // parsed to RecurrenceKind, legacy aliases allowed
    pub start_date: Option<String>, // yyyy-mm-dd or dd.mm.yyyy, defaults to today
    pub week_days: Option<Vec<u8>>,
    pub interval_days: Option<u32>,
    pub duration_days: Option<u32>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub success: bool,
    pub habit_id: String,
    pub due_today: bool,
    pub today_entry_id: Option<String>,
    pub message: String,
}

/// Create a new habit using the provided storage
pub fn create_habit<S: HabitStorage + ?Sized>(
    storage: &S,
    clock: &dyn Clock,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, EngineError> {
    let user_id = parse_user_id(&params.user_id)?;
    let kind: RecurrenceKind = params.recurrence.parse()?;
    let start_date = parse_day_or_today(params.start_date.as_deref(), clock)?;

    let rule = RecurrenceRule {
        kind,
        start_date,
        week_days: params.week_days.unwrap_or_default(),
        interval_days: params.interval_days,
        duration_days: params.duration_days,
    };

    let habit = HabitDefinition::new(user_id, params.name, params.description, rule)?;
    storage.create_habit(&habit)?;

    let today = clock.today();
    let seeded = EntryScheduler::new(storage).seed_entry(&habit, today)?;

    tracing::info!(habit_id = %habit.id, due_today = seeded.is_some(), "Created habit");

    let message = match seeded {
        Some(_) => format!("✅ Created habit '{}'! It's due today, ready to start your streak!", habit.name),
        None => format!("✅ Created habit '{}'!", habit.name),
    };

    Ok(CreateHabitResponse {
        success: true,
        habit_id: habit.id.to_string(),
        due_today: seeded.is_some(),
        today_entry_id: seeded.map(|entry| entry.id.to_string()),
        message,
    })
}
