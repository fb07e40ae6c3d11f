/// Public library interface for the habit streak engine
///
/// This module exports the engine facade, the pure recurrence/streak/milestone
/// functions, the storage port with its SQLite adapter, and the collaborator
/// actions built on top of them.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

// Internal modules
mod domain;
mod storage;
mod analytics;
mod scheduler;
pub mod actions;
pub mod clock;
pub mod config;

// Re-export public modules and types
pub use domain::*;
pub use storage::{HabitStorage, SqliteStorage, StorageError};
pub use analytics::{RefreshReport, StreakRefresher};
pub use scheduler::{duration_until_next_midnight, run_daily, EntryScheduler, ScheduleReport};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;

/// Errors that can occur while running the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Storage(#[from] StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// The referenced habit or entry does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Storage(e) if e.is_not_found())
    }
}

/// Result of one full daily pass
#[derive(Debug, Clone, Serialize)]
pub struct DailyPassReport {
    pub date: CalendarDay,
    pub entries_created: usize,
    pub entry_failures: u32,
    pub streaks: RefreshReport,
}

/// Entry point tying storage, clock and the engine services together
///
/// The binary drives this once per local day; tests construct it over an
/// in-memory store with a fixed clock.
pub struct HabitEngine<S: HabitStorage = SqliteStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl HabitEngine<SqliteStorage> {
    /// Open (creating if needed) the SQLite database at `db_path`
    pub fn open(db_path: PathBuf) -> Result<Self, EngineError> {
        info!("Initializing habit streak engine with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        Ok(Self::with_parts(storage, Arc::new(SystemClock)))
    }
}

impl<S: HabitStorage> HabitEngine<S> {
    pub fn with_parts(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Get a reference to the storage layer
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn today(&self) -> CalendarDay {
        self.clock.today()
    }

    /// Create any missing tracking entries for `date` across all habits
    pub fn reconcile(&self, date: CalendarDay) -> Result<ScheduleReport, EngineError> {
        let habits = self.storage.list_habits(None)?;
        Ok(EntryScheduler::new(&self.storage).ensure_entries(&habits, date))
    }

    /// Recompute every habit and user streak cache as of `date`
    pub fn refresh_streaks(&self, date: CalendarDay) -> Result<RefreshReport, EngineError> {
        Ok(StreakRefresher::new(&self.storage).refresh_all(date)?)
    }

    /// Entries first, then streaks, so the scan sees an up to date history
    pub fn run_daily_pass(&self, date: CalendarDay) -> Result<DailyPassReport, EngineError> {
        let schedule = self.reconcile(date)?;
        let streaks = self.refresh_streaks(date)?;

        Ok(DailyPassReport {
            date,
            entries_created: schedule.created.len(),
            entry_failures: schedule.failures,
            streaks,
        })
    }

    /// Run until cancelled: an optional startup pass for today, then one
    /// daily pass at every local midnight
    ///
    /// The startup pass covers a midnight missed while the daemon was down.
    /// Streak caches remember the day they were computed for, so rerunning a
    /// day that already ran leaves them unchanged. Days missed in between
    /// are not replayed; the first pass decays a broken streak by one.
    pub async fn run(&self, pass_on_startup: bool) {
        let today = self.today();

        if pass_on_startup {
            match self.run_daily_pass(today) {
                Ok(report) => info!(
                    date = %today,
                    created = report.entries_created,
                    habits = report.streaks.habits_refreshed,
                    "Startup pass complete"
                ),
                Err(e) => tracing::error!(date = %today, error = %e, "Startup pass failed"),
            }
        }

        run_daily(self.clock.as_ref(), today, |date| self.run_daily_pass(date)).await;
    }
}
