/// HabitDefinition entity and its recurrence rule
///
/// This module defines the habit a user wants to perform on a recurring basis,
/// the `RecurrenceRule` describing when it is due, and the validation applied
/// whenever a habit is created or edited.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{CalendarDay, DomainError, HabitId, RecurrenceKind, UserId};

/// When a habit is due
///
/// Only the parameters relevant to `kind` are consulted when evaluating
/// due-ness; the others are carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    /// First day the habit can be due
    pub start_date: CalendarDay,
    /// Canonical weekday indices (Monday=0 .. Sunday=6), used by Weekly
    #[serde(default)]
    pub week_days: Vec<u8>,
    /// Every N days, used by Interval
    #[serde(default)]
    pub interval_days: Option<u32>,
    /// Bounds the active window to `[start_date, start_date + duration)`
    #[serde(default)]
    pub duration_days: Option<u32>,
}

impl RecurrenceRule {
    /// A rule with no optional parameters set
    pub fn new(kind: RecurrenceKind, start_date: CalendarDay) -> Self {
        Self {
            kind,
            start_date,
            week_days: Vec::new(),
            interval_days: None,
            duration_days: None,
        }
    }

    pub fn daily(start_date: CalendarDay) -> Self {
        Self::new(RecurrenceKind::Daily, start_date)
    }

    pub fn weekly(start_date: CalendarDay, week_days: impl IntoIterator<Item = u8>) -> Self {
        Self {
            week_days: week_days.into_iter().collect(),
            ..Self::new(RecurrenceKind::Weekly, start_date)
        }
    }

    pub fn monthly(start_date: CalendarDay) -> Self {
        Self::new(RecurrenceKind::Monthly, start_date)
    }

    pub fn every_n_days(start_date: CalendarDay, interval_days: u32) -> Self {
        Self {
            interval_days: Some(interval_days),
            ..Self::new(RecurrenceKind::Interval, start_date)
        }
    }

    /// Limit the active window to `days` days from the start date
    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        self
    }

    /// Validate the rule and normalize the weekday set (sorted, deduplicated)
    pub fn validate(&mut self) -> Result<(), DomainError> {
        if let Some(bad) = self.week_days.iter().find(|day| **day > 6) {
            return Err(DomainError::InvalidRecurrence {
                reason: format!("Weekday index {} is out of range (Monday=0 .. Sunday=6)", bad),
            });
        }
        self.week_days.sort_unstable();
        self.week_days.dedup();

        match self.kind {
            RecurrenceKind::Weekly if self.week_days.is_empty() => {
                return Err(DomainError::InvalidRecurrence {
                    reason: "Weekly habits must specify at least one weekday".to_string(),
                });
            }
            RecurrenceKind::Interval => match self.interval_days {
                Some(days) if days >= 1 => {}
                Some(days) => {
                    return Err(DomainError::InvalidRecurrence {
                        reason: format!("Interval must be at least 1 day, got {}", days),
                    });
                }
                None => {
                    return Err(DomainError::InvalidRecurrence {
                        reason: "Interval habits must specify the number of days between repetitions".to_string(),
                    });
                }
            },
            _ => {}
        }

        if self.duration_days == Some(0) {
            return Err(DomainError::InvalidRecurrence {
                reason: "Duration must be at least 1 day when specified".to_string(),
            });
        }

        Ok(())
    }

    /// Whether switching from `self` to `other` invalidates existing entries
    ///
    /// Entries were filed under the old due-ness; a different kind, start date
    /// or weekday set means they no longer line up with the new schedule.
    pub fn schedule_changed(&self, other: &RecurrenceRule) -> bool {
        self.kind != other.kind
            || self.start_date != other.start_date
            || self.week_days != other.week_days
    }
}

/// A habit the user wants to perform on a recurring schedule
///
/// `current_streak` and `longest_streak` are caches written by the nightly
/// streak pass; they are derived state, never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDefinition {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Owner of the habit
    pub user_id: UserId,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// When the habit is due
    pub recurrence: RecurrenceRule,
    /// Cached current streak
    pub current_streak: u32,
    /// Cached longest streak
    pub longest_streak: u32,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
}

impl HabitDefinition {
    /// Create a new habit with validation
    ///
    /// This is the main constructor that validates all fields and returns
    /// an error if any validation fails.
    pub fn new(
        user_id: UserId,
        name: String,
        description: Option<String>,
        mut recurrence: RecurrenceRule,
    ) -> Result<Self, DomainError> {
        Self::validate_name(&name)?;
        Self::validate_description(&description)?;
        recurrence.validate()?;

        Ok(Self {
            id: HabitId::new(),
            user_id,
            name: name.trim().to_string(),
            description,
            recurrence,
            current_streak: 0,
            longest_streak: 0,
            created_at: Utc::now(),
        })
    }

    /// Create a habit from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated and is mainly used
    /// by the storage layer when loading habits from the database.
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: HabitId,
        user_id: UserId,
        name: String,
        description: Option<String>,
        recurrence: RecurrenceRule,
        current_streak: u32,
        longest_streak: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            description,
            recurrence,
            current_streak,
            longest_streak,
            created_at,
        }
    }

    /// Update the habit's properties with validation
    ///
    /// Nothing is applied unless every new value validates. Returns `true`
    /// when the recurrence changed in a way that invalidates existing
    /// tracking entries (see `RecurrenceRule::schedule_changed`).
    pub fn update(
        &mut self,
        name: Option<String>,
        description: Option<Option<String>>,
        recurrence: Option<RecurrenceRule>,
    ) -> Result<bool, DomainError> {
        if let Some(ref new_name) = name {
            Self::validate_name(new_name)?;
        }

        if let Some(ref new_desc) = description {
            Self::validate_description(new_desc)?;
        }

        let recurrence = match recurrence {
            Some(mut rule) => {
                rule.validate()?;
                Some(rule)
            }
            None => None,
        };

        if let Some(new_name) = name {
            self.name = new_name.trim().to_string();
        }
        if let Some(new_description) = description {
            self.description = new_description;
        }

        let mut schedule_changed = false;
        if let Some(new_rule) = recurrence {
            schedule_changed = self.recurrence.schedule_changed(&new_rule);
            self.recurrence = new_rule;
        }

        Ok(schedule_changed)
    }

    /// Replace the cached streak values
    pub fn set_streak_cache(&mut self, current: u32, longest: u32) {
        self.current_streak = current;
        self.longest_streak = longest;
    }

    /// Validate habit name according to business rules
    fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string()
            ));
        }

        Ok(())
    }

    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.chars().count() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }
}
