/// Streak status for a user's habits
///
/// Reads the persisted streak caches (written by the nightly pass) and
/// decorates them with milestone tiers, messages and growth stages.

use serde::{Deserialize, Serialize};

use crate::actions::{parse_habit_id, parse_user_id};
use crate::clock::Clock;
use crate::domain::{
    classify, growth_stage, highest_milestone, CalendarDay, HabitDefinition, MilestoneTier, StreakSummary,
};
use crate::storage::{HabitStorage, StorageError};
use crate::EngineError;

/// Parameters for checking streak status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusParams {
    pub user_id: String,
    pub habit_id: Option<String>, // If omitted, returns all of the user's habits
}

/// Information about a single habit's status
#[derive(Debug, Serialize)]
pub struct HabitStatus {
    pub habit_id: String,
    pub name: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub completion_percentage: f64,
    pub last_completed: Option<String>,
    pub milestone: MilestoneTier,
    pub highest_milestone: Option<u32>,
    pub growth_stage: u8,
    pub status: String, // "new", "active" or "inactive"
    pub message: String,
}

/// The user's all-habits streak
#[derive(Debug, Serialize)]
pub struct AggregateStatus {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub milestone: MilestoneTier,
    pub message: String,
    pub updated_at: Option<String>,
}

/// Response from checking streak status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub user_id: String,
    pub habits: Vec<HabitStatus>,
    pub aggregate: AggregateStatus,
    pub summary: String,
}

fn habit_status<S: HabitStorage + ?Sized>(
    storage: &S,
    habit: HabitDefinition,
    today: CalendarDay,
) -> Result<HabitStatus, StorageError> {
    let history = storage.get_entries_for_habit(&habit.id, habit.recurrence.start_date, today)?;
    let summary = StreakSummary::from_history(&habit, &history, today);
    let tier = classify(summary.current_streak);

    let status = if summary.total_completions == 0 && summary.longest_streak == 0 {
        "new"
    } else if summary.current_streak > 0 {
        "active"
    } else {
        "inactive"
    };

    Ok(HabitStatus {
        habit_id: habit.id.to_string(),
        name: habit.name,
        current_streak: summary.current_streak,
        longest_streak: summary.longest_streak,
        total_completions: summary.total_completions,
        completion_percentage: summary.completion_percentage,
        last_completed: summary.last_completed.map(|d| d.to_string()),
        milestone: tier,
        highest_milestone: highest_milestone(summary.longest_streak),
        growth_stage: growth_stage(summary.completion_percentage),
        status: status.to_string(),
        message: tier.message(summary.current_streak),
    })
}

/// Get streak status for a user's habits using the provided storage
pub fn get_streak_status<S: HabitStorage + ?Sized>(
    storage: &S,
    clock: &dyn Clock,
    params: StatusParams,
) -> Result<StatusResponse, EngineError> {
    let user_id = parse_user_id(&params.user_id)?;
    let today = clock.today();

    let habits = match params.habit_id {
        Some(ref raw) => {
            let habit_id = parse_habit_id(raw)?;
            let habit = storage.get_habit(&habit_id)?;
            // Another user's habit is reported as missing
            if habit.user_id != user_id {
                return Err(StorageError::HabitNotFound { habit_id: raw.clone() }.into());
            }
            vec![habit]
        }
        None => storage.list_habits(Some(&user_id))?,
    };

    let statuses = habits
        .into_iter()
        .map(|habit| habit_status(storage, habit, today))
        .collect::<Result<Vec<_>, _>>()?;

    let state = storage.get_user_streak(&user_id)?;
    let aggregate_tier = classify(state.current_streak);
    let aggregate = AggregateStatus {
        current_streak: state.current_streak,
        longest_streak: state.longest_streak,
        milestone: aggregate_tier,
        message: aggregate_tier.message(state.current_streak),
        updated_at: state.updated_at.map(|t| t.to_rfc3339()),
    };

    let summary = if statuses.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let active = statuses.iter().filter(|h| h.current_streak > 0).count();
        format!(
            "📊 Status: {} of {} habits active. All-habits streak: {} days (best {})",
            active,
            statuses.len(),
            aggregate.current_streak,
            aggregate.longest_streak
        )
    };

    Ok(StatusResponse {
        user_id: user_id.to_string(),
        habits: statuses,
        aggregate,
        summary,
    })
}
