/// Editing habits
///
/// When an edit changes the recurrence kind, start date or weekday set, the
/// habit's existing entries no longer match its schedule: they are purged,
/// the current streak cache is reset, and today's entry is re-created if the
/// habit is due today under the new rule.

use serde::{Deserialize, Serialize};

use crate::actions::parse_habit_id;
use crate::clock::Clock;
use crate::domain::{CalendarDay, RecurrenceKind, StreakCache, StreakCounts};
use crate::scheduler::EntryScheduler;
use crate::storage::HabitStorage;
use crate::EngineError;

/// Parameters for updating an existing habit
///
/// Omitted fields keep their current value. An empty description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHabitParams {
    pub habit_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub recurrence: Option<String>,
    pub start_date: Option<String>,
    pub week_days: Option<Vec<u8>>,
    pub interval_days: Option<u32>,
    pub duration_days: Option<u32>,
}

impl UpdateHabitParams {
    fn touches_recurrence(&self) -> bool {
        self.recurrence.is_some()
            || self.start_date.is_some()
            || self.week_days.is_some()
            || self.interval_days.is_some()
            || self.duration_days.is_some()
    }
}

/// Response from updating a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub success: bool,
    pub schedule_changed: bool,
    pub entries_purged: usize,
    pub today_entry_id: Option<String>,
    pub message: String,
}

/// Update an existing habit using the provided storage
pub fn update_habit<S: HabitStorage + ?Sized>(
    storage: &S,
    clock: &dyn Clock,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let mut habit = storage.get_habit(&habit_id)?;

    let new_rule = if params.touches_recurrence() {
        let mut rule = habit.recurrence.clone();
        if let Some(ref kind) = params.recurrence {
            rule.kind = kind.parse::<RecurrenceKind>()?;
        }
        if let Some(ref start) = params.start_date {
            rule.start_date = CalendarDay::parse(start)?;
        }
        if let Some(ref days) = params.week_days {
            rule.week_days = days.clone();
        }
        if params.interval_days.is_some() {
            rule.interval_days = params.interval_days;
        }
        if params.duration_days.is_some() {
            rule.duration_days = params.duration_days;
        }
        Some(rule)
    } else {
        None
    };

    let description = params
        .description
        .map(|text| Some(text).filter(|t| !t.trim().is_empty()));

    let schedule_changed = habit.update(params.name, description, new_rule)?;
    storage.update_habit(&habit)?;

    let mut entries_purged = 0;
    let mut today_entry_id = None;

    if schedule_changed {
        entries_purged = storage.delete_entries_for_habit(&habit.id)?;

        // History the current streak was built on is gone
        let counts = StreakCounts::new(0, habit.longest_streak);
        storage.update_habit_streak(&habit.id, &StreakCache::unanchored(counts))?;
        habit.set_streak_cache(counts.current, counts.longest);

        let seeded = EntryScheduler::new(storage).seed_entry(&habit, clock.today())?;
        today_entry_id = seeded.map(|entry| entry.id.to_string());

        tracing::info!(
            habit_id = %habit.id,
            entries_purged,
            due_today = today_entry_id.is_some(),
            "Habit schedule changed, entries reset"
        );
    }

    let message = if schedule_changed {
        format!("🔄 Updated habit '{}' with a new schedule. Previous entries were cleared.", habit.name)
    } else {
        format!("✅ Updated habit '{}'", habit.name)
    };

    Ok(UpdateHabitResponse {
        success: true,
        schedule_changed,
        entries_purged,
        today_entry_id,
        message,
    })
}
