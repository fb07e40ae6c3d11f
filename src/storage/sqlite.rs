/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habits, tracking entries and streak caches. It handles all
/// SQL queries and data conversion.

use std::path::PathBuf;
use rusqlite::{params, Connection, OptionalExtension, Row};
use chrono::{DateTime, Utc};

use crate::domain::{
    CalendarDay, EntryId, HabitDefinition, HabitId, RecurrenceKind, RecurrenceRule,
    StreakCache, StreakCounts, TrackingEntry, UserId, UserStreakState,
};
use crate::storage::{migrations, HabitStorage, StorageError};

const HABIT_COLUMNS: &str = "id, user_id, name, description, recurrence, start_date, week_days, \
     interval_days, duration_days, current_streak, longest_streak, created_at";

const ENTRY_COLUMNS: &str = "id, habit_id, user_id, date, completed, note, created_at";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// all the storage operations defined in the HabitStorage trait.
pub struct SqliteStorage {
    conn: Connection,
}

/// A habits row as stored, before interpretation
///
/// Kept separate so listing can skip rows whose recurrence tag or start date
/// no longer parses instead of failing the whole query.
struct HabitRow {
    id: String,
    user_id: String,
    name: String,
    description: Option<String>,
    recurrence: String,
    start_date: String,
    week_days: String,
    interval_days: Option<u32>,
    duration_days: Option<u32>,
    current_streak: u32,
    longest_streak: u32,
    created_at: String,
}

impl HabitRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            recurrence: row.get(4)?,
            start_date: row.get(5)?,
            week_days: row.get(6)?,
            interval_days: row.get(7)?,
            duration_days: row.get(8)?,
            current_streak: row.get(9)?,
            longest_streak: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    fn into_habit(self) -> Result<HabitDefinition, StorageError> {
        let corrupt = |reason: String| StorageError::CorruptRow { id: self.id.clone(), reason };

        let id = HabitId::from_string(&self.id).map_err(|e| corrupt(format!("invalid habit id: {}", e)))?;
        let user_id = UserId::from_string(&self.user_id).map_err(|e| corrupt(format!("invalid user id: {}", e)))?;
        let kind: RecurrenceKind = self.recurrence.parse().map_err(|e| corrupt(format!("{}", e)))?;
        let start_date = CalendarDay::parse(&self.start_date).map_err(|e| corrupt(format!("{}", e)))?;
        let week_days: Vec<u8> = serde_json::from_str(&self.week_days)
            .map_err(|e| corrupt(format!("invalid weekday set: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("invalid created_at: {}", e)))?
            .with_timezone(&Utc);

        let recurrence = RecurrenceRule {
            kind,
            start_date,
            week_days,
            interval_days: self.interval_days,
            duration_days: self.duration_days,
        };

        Ok(HabitDefinition::from_existing(
            id,
            user_id,
            self.name,
            self.description,
            recurrence,
            self.current_streak,
            self.longest_streak,
            created_at,
        ))
    }
}

/// Map a text column that failed to parse into a rusqlite conversion error
fn text_column_error(index: usize, message: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(index, message.to_string(), rusqlite::types::Type::Text)
}

/// Read an optional `yyyy-mm-dd` column
fn optional_day(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<CalendarDay>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|text| CalendarDay::parse(&text).map_err(|_| text_column_error(index, "Invalid date")))
        .transpose()
}

/// Columns `current, longest, base_current, base_longest, streak_as_of`
fn streak_cache_from_row(row: &Row<'_>) -> rusqlite::Result<StreakCache> {
    Ok(StreakCache {
        counts: StreakCounts::new(row.get(0)?, row.get(1)?),
        base: StreakCounts::new(row.get(2)?, row.get(3)?),
        as_of: optional_day(row, 4)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TrackingEntry> {
    let id_str: String = row.get(0)?;
    let id = EntryId::from_string(&id_str).map_err(|_| text_column_error(0, "Invalid UUID"))?;

    let habit_id_str: String = row.get(1)?;
    let habit_id = HabitId::from_string(&habit_id_str).map_err(|_| text_column_error(1, "Invalid UUID"))?;

    let user_id_str: String = row.get(2)?;
    let user_id = UserId::from_string(&user_id_str).map_err(|_| text_column_error(2, "Invalid UUID"))?;

    let date_str: String = row.get(3)?;
    let date = CalendarDay::parse(&date_str).map_err(|_| text_column_error(3, "Invalid date"))?;

    let created_at_str: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|_| text_column_error(6, "Invalid datetime"))?
        .with_timezone(&Utc);

    Ok(TrackingEntry::from_existing(
        id,
        habit_id,
        user_id,
        date,
        row.get(4)?, // completed
        row.get(5)?, // note
        created_at,
    ))
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::with_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Create a storage instance backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        // Required for ON DELETE CASCADE from habits to entries
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Translate constraint failures on entry insert into domain errors
    fn map_entry_insert_error(err: rusqlite::Error, entry: &TrackingEntry) -> StorageError {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StorageError::DuplicateEntry {
                        habit_id: entry.habit_id.to_string(),
                        date: entry.date.to_string(),
                    };
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StorageError::HabitNotFound {
                        habit_id: entry.habit_id.to_string(),
                    };
                }
                _ => {}
            }
        }
        StorageError::Query(err)
    }

    fn query_entries<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<TrackingEntry>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let entry_iter = stmt.query_map(params, entry_from_row)?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }

        Ok(entries)
    }
}

impl HabitStorage for SqliteStorage {
    fn create_habit(&self, habit: &HabitDefinition) -> Result<(), StorageError> {
        let week_days_json = serde_json::to_string(&habit.recurrence.week_days)?;

        self.conn.execute(
            &format!(
                "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                HABIT_COLUMNS
            ),
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.name,
                habit.description,
                habit.recurrence.kind.as_str(),
                habit.recurrence.start_date.to_string(),
                week_days_json,
                habit.recurrence.interval_days,
                habit.recurrence.duration_days,
                habit.current_streak,
                habit.longest_streak,
                habit.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<HabitDefinition, StorageError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![habit_id.to_string()],
                HabitRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => row.into_habit(),
            None => Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            }),
        }
    }

    fn update_habit(&self, habit: &HabitDefinition) -> Result<(), StorageError> {
        let week_days_json = serde_json::to_string(&habit.recurrence.week_days)?;

        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                name = ?2,
                description = ?3,
                recurrence = ?4,
                start_date = ?5,
                week_days = ?6,
                interval_days = ?7,
                duration_days = ?8
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.name,
                habit.description,
                habit.recurrence.kind.as_str(),
                habit.recurrence.start_date.to_string(),
                week_days_json,
                habit.recurrence.interval_days,
                habit.recurrence.duration_days,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit.id.to_string(),
            });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;

        let entries_removed = tx.execute(
            "DELETE FROM tracking_entries WHERE habit_id = ?1",
            params![habit_id.to_string()],
        )?;
        let rows_affected = tx.execute(
            "DELETE FROM habits WHERE id = ?1",
            params![habit_id.to_string()],
        )?;

        if rows_affected == 0 {
            // Dropping the transaction rolls back
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tx.commit()?;

        tracing::debug!("Deleted habit {} and {} entries", habit_id, entries_removed);
        Ok(entries_removed)
    }

    fn list_habits(&self, user_id: Option<&UserId>) -> Result<Vec<HabitDefinition>, StorageError> {
        let mut sql = format!("SELECT {} FROM habits", HABIT_COLUMNS);
        if user_id.is_some() {
            sql.push_str(" WHERE user_id = ?1");
        }
        sql.push_str(" ORDER BY created_at ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match user_id {
            Some(user) => stmt
                .query_map(params![user.to_string()], HabitRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], HabitRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        let mut habits = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_habit() {
                Ok(habit) => habits.push(habit),
                Err(e) => tracing::warn!(error = %e, "Skipping habit row that cannot be interpreted"),
            }
        }

        Ok(habits)
    }

    fn get_habit_streak(&self, habit_id: &HabitId) -> Result<StreakCache, StorageError> {
        self.conn
            .query_row(
                "SELECT current_streak, longest_streak, base_current_streak, base_longest_streak, streak_as_of
                 FROM habits WHERE id = ?1",
                params![habit_id.to_string()],
                streak_cache_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })
    }

    fn update_habit_streak(&self, habit_id: &HabitId, cache: &StreakCache) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                current_streak = ?2,
                longest_streak = ?3,
                base_current_streak = ?4,
                base_longest_streak = ?5,
                streak_as_of = ?6
             WHERE id = ?1",
            params![
                habit_id.to_string(),
                cache.counts.current,
                cache.counts.longest,
                cache.base.current,
                cache.base.longest,
                cache.as_of.map(|day| day.to_string()),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        Ok(())
    }

    fn list_user_ids(&self) -> Result<Vec<UserId>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT user_id FROM habits ORDER BY user_id")?;
        let ids = stmt.query_map([], |row| {
            let raw: String = row.get(0)?;
            UserId::from_string(&raw).map_err(|_| text_column_error(0, "Invalid UUID"))
        })?;

        let mut users = Vec::new();
        for id in ids {
            users.push(id?);
        }

        Ok(users)
    }

    fn create_entry(&self, entry: &TrackingEntry) -> Result<(), StorageError> {
        self.conn
            .execute(
                &format!("INSERT INTO tracking_entries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", ENTRY_COLUMNS),
                params![
                    entry.id.to_string(),
                    entry.habit_id.to_string(),
                    entry.user_id.to_string(),
                    entry.date.to_string(),
                    entry.completed,
                    entry.note,
                    entry.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Self::map_entry_insert_error(e, entry))?;

        tracing::debug!("Created tracking entry {} for habit {} on {}", entry.id, entry.habit_id, entry.date);
        Ok(())
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<TrackingEntry, StorageError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM tracking_entries WHERE id = ?1", ENTRY_COLUMNS),
                params![entry_id.to_string()],
                entry_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::EntryNotFound {
                entry_id: entry_id.to_string(),
            })
    }

    fn find_entry(&self, habit_id: &HabitId, date: CalendarDay) -> Result<Option<TrackingEntry>, StorageError> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tracking_entries WHERE habit_id = ?1 AND date = ?2", ENTRY_COLUMNS),
                params![habit_id.to_string(), date.to_string()],
                entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    fn get_entries_for_habit(
        &self,
        habit_id: &HabitId,
        from: CalendarDay,
        to: CalendarDay,
    ) -> Result<Vec<TrackingEntry>, StorageError> {
        self.query_entries(
            &format!(
                "SELECT {} FROM tracking_entries
                 WHERE habit_id = ?1 AND date BETWEEN ?2 AND ?3
                 ORDER BY date DESC",
                ENTRY_COLUMNS
            ),
            params![habit_id.to_string(), from.to_string(), to.to_string()],
        )
    }

    fn get_entries_for_user_on(&self, user_id: &UserId, date: CalendarDay) -> Result<Vec<TrackingEntry>, StorageError> {
        self.query_entries(
            &format!(
                "SELECT {} FROM tracking_entries WHERE user_id = ?1 AND date = ?2 ORDER BY created_at",
                ENTRY_COLUMNS
            ),
            params![user_id.to_string(), date.to_string()],
        )
    }

    fn get_entries_for_user(
        &self,
        user_id: &UserId,
        from: CalendarDay,
        to: CalendarDay,
    ) -> Result<Vec<TrackingEntry>, StorageError> {
        self.query_entries(
            &format!(
                "SELECT {} FROM tracking_entries
                 WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
                 ORDER BY date DESC",
                ENTRY_COLUMNS
            ),
            params![user_id.to_string(), from.to_string(), to.to_string()],
        )
    }

    fn update_entry(&self, entry: &TrackingEntry) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE tracking_entries SET completed = ?2, note = ?3 WHERE id = ?1",
            params![entry.id.to_string(), entry.completed, entry.note],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::EntryNotFound {
                entry_id: entry.id.to_string(),
            });
        }

        Ok(())
    }

    fn delete_entries_for_habit(&self, habit_id: &HabitId) -> Result<usize, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM tracking_entries WHERE habit_id = ?1",
            params![habit_id.to_string()],
        )?;

        tracing::debug!("Purged {} entries for habit {}", removed, habit_id);
        Ok(removed)
    }

    fn get_user_streak(&self, user_id: &UserId) -> Result<UserStreakState, StorageError> {
        let state = self
            .conn
            .query_row(
                "SELECT current_streak, longest_streak, base_current_streak, base_longest_streak, streak_as_of, updated_at
                 FROM user_streaks WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    let cache = streak_cache_from_row(row)?;
                    let updated_at: Option<String> = row.get(5)?;
                    Ok(UserStreakState {
                        user_id: user_id.clone(),
                        current_streak: cache.counts.current,
                        longest_streak: cache.counts.longest,
                        base: cache.base,
                        as_of: cache.as_of,
                        updated_at: updated_at
                            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                            .map(|dt| dt.with_timezone(&Utc)),
                    })
                },
            )
            .optional()?;

        // No row yet means the nightly pass has not covered this user
        Ok(state.unwrap_or_else(|| UserStreakState::new(user_id.clone())))
    }

    fn save_user_streak(&self, state: &UserStreakState) -> Result<(), StorageError> {
        let updated_at = state.updated_at.unwrap_or_else(Utc::now).to_rfc3339();

        self.conn.execute(
            "INSERT INTO user_streaks
                (user_id, current_streak, longest_streak, base_current_streak, base_longest_streak, streak_as_of, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                base_current_streak = excluded.base_current_streak,
                base_longest_streak = excluded.base_longest_streak,
                streak_as_of = excluded.streak_as_of,
                updated_at = excluded.updated_at",
            params![
                state.user_id.to_string(),
                state.current_streak,
                state.longest_streak,
                state.base.current,
                state.base.longest,
                state.as_of.map(|day| day.to_string()),
                updated_at,
            ],
        )?;

        tracing::debug!("Updated aggregate streak for user {}", state.user_id);
        Ok(())
    }
}
