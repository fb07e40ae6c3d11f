/// Listing habits with their schedule for a given day

use serde::{Deserialize, Serialize};

use crate::actions::{parse_day_or_today, parse_user_id};
use crate::clock::Clock;
use crate::domain::{RecurrenceKind, RecurrenceRule};
use crate::storage::HabitStorage;
use crate::EngineError;

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parameters for listing habits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListHabitsParams {
    pub user_id: Option<String>, // all users when omitted
    pub date: Option<String>,    // defaults to today
}

/// Information about a habit in the list
#[derive(Debug, Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub user_id: String,
    pub name: String,
    pub recurrence: String,
    pub start_date: String,
    pub due_on_date: bool,
    pub next_due: Option<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Summary statistics for the listed habits
#[derive(Debug, Serialize)]
pub struct HabitListSummary {
    pub total_habits: u32,
    pub due_on_date: u32,
    pub with_active_streak: u32,
}

/// Response from listing habits
#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub date: String,
    pub habits: Vec<HabitSummary>,
    pub summary: HabitListSummary,
}

/// Human readable form of a recurrence rule
pub fn describe_recurrence(rule: &RecurrenceRule) -> String {
    let base = match rule.kind {
        RecurrenceKind::Daily => "every day".to_string(),
        RecurrenceKind::Weekly => {
            let days: Vec<&str> = rule
                .week_days
                .iter()
                .filter_map(|d| WEEKDAY_NAMES.get(usize::from(*d)).copied())
                .collect();
            format!("weekly on {}", days.join(", "))
        }
        RecurrenceKind::Monthly => format!("monthly on day {}", rule.start_date.day_of_month()),
        RecurrenceKind::Interval => match rule.interval_days.unwrap_or(1) {
            1 => "every day".to_string(),
            n => format!("every {} days", n),
        },
    };

    match rule.duration_days {
        Some(days) => format!("{} for {} days", base, days),
        None => base,
    }
}

/// List habits using the provided storage
pub fn list_habits<S: HabitStorage + ?Sized>(
    storage: &S,
    clock: &dyn Clock,
    params: ListHabitsParams,
) -> Result<ListHabitsResponse, EngineError> {
    let user_id = params.user_id.as_deref().map(parse_user_id).transpose()?;
    let date = parse_day_or_today(params.date.as_deref(), clock)?;

    let habits = storage.list_habits(user_id.as_ref())?;

    let summaries: Vec<HabitSummary> = habits
        .into_iter()
        .map(|habit| HabitSummary {
            habit_id: habit.id.to_string(),
            user_id: habit.user_id.to_string(),
            recurrence: describe_recurrence(&habit.recurrence),
            start_date: habit.recurrence.start_date.to_string(),
            due_on_date: habit.recurrence.is_due_on(date),
            next_due: habit.recurrence.next_due_date(date).map(|d| d.to_string()),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            name: habit.name,
        })
        .collect();

    let summary = HabitListSummary {
        total_habits: summaries.len() as u32,
        due_on_date: summaries.iter().filter(|h| h.due_on_date).count() as u32,
        with_active_streak: summaries.iter().filter(|h| h.current_streak > 0).count() as u32,
    };

    Ok(ListHabitsResponse {
        date: date.to_string(),
        habits: summaries,
        summary,
    })
}
