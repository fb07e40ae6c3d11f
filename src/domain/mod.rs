/// Domain module containing core business logic and data types
///
/// This module defines the core entities (HabitDefinition, TrackingEntry,
/// UserStreakState) and the pure engines that operate on them: recurrence
/// evaluation, streak computation and milestone classification.

pub mod calendar;
pub mod entry;
pub mod habit;
pub mod milestone;
pub mod recurrence;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use calendar::*;
pub use entry::*;
pub use habit::*;
pub use milestone::*;
pub use recurrence::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid recurrence: {reason}")]
    InvalidRecurrence { reason: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
