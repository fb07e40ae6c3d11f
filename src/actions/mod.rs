/// Collaborator actions
///
/// Request/response procedures that an outer layer (HTTP handlers, a CLI,
/// a UI bridge) calls on behalf of a user: creating, editing and deleting
/// habits, toggling entries, and reading streak status. Each takes the store
/// and a clock explicitly.

pub mod create;
pub mod update;
pub mod delete;
pub mod toggle;
pub mod list;
pub mod status;

pub use create::*;
pub use update::*;
pub use delete::*;
pub use toggle::*;
pub use list::*;
pub use status::*;

use crate::clock::Clock;
use crate::domain::{CalendarDay, EntryId, HabitId, UserId};
use crate::EngineError;

fn parse_habit_id(raw: &str) -> Result<HabitId, EngineError> {
    HabitId::from_string(raw.trim())
        .map_err(|_| EngineError::InvalidInput(format!("Invalid habit ID format: '{}'", raw)))
}

fn parse_user_id(raw: &str) -> Result<UserId, EngineError> {
    UserId::from_string(raw.trim())
        .map_err(|_| EngineError::InvalidInput(format!("Invalid user ID format: '{}'", raw)))
}

fn parse_entry_id(raw: &str) -> Result<EntryId, EngineError> {
    EntryId::from_string(raw.trim())
        .map_err(|_| EngineError::InvalidInput(format!("Invalid entry ID format: '{}'", raw)))
}

/// Parse an optional date, defaulting to the clock's today
fn parse_day_or_today(raw: Option<&str>, clock: &dyn Clock) -> Result<CalendarDay, EngineError> {
    match raw {
        Some(text) => Ok(CalendarDay::parse(text)?),
        None => Ok(clock.today()),
    }
}
