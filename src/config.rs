/// On-disk configuration
///
/// An optional JSON file (`~/.habit_streaks/config.json` by default) supplies
/// defaults that command line flags override.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::EngineError;

const APP_DIR: &str = ".habit_streaks";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "habits.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file; resolved by `default_database_path` when unset
    pub database_path: Option<PathBuf>,
    /// Run today's daily pass (entries, then streaks) when the daemon starts
    pub reconcile_on_startup: bool,
    /// `tracing` filter directive, e.g. `habit_streak_engine=debug`
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            reconcile_on_startup: true,
            log_filter: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit file; a missing file is an error
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            EngineError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(explicit) => Self::load(explicit),
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(&default),
                _ => Ok(Self::default()),
            },
        }
    }
}

/// Get the default database path with robust fallback strategy
///
/// Tries the home, data, config and working directories in that order and
/// picks the first one that is writable, falling back to the temp directory.
pub fn default_database_path() -> Result<PathBuf, EngineError> {
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(APP_DIR)),
        dirs::data_dir().map(|p| p.join("habit_streaks")),
        dirs::config_dir().map(|p| p.join("habit_streaks")),
        std::env::current_dir().ok().map(|p| p.join(APP_DIR)),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if fs::create_dir_all(potential_path).is_ok() {
            let test_file = potential_path.join(".test_write");
            if fs::write(&test_file, "test").is_ok() {
                let _ = fs::remove_file(&test_file);
                return Ok(potential_path.join(DATABASE_FILE));
            }
        }
    }

    let temp_path = std::env::temp_dir().join("habit_streaks");
    fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path.join(DATABASE_FILE))
}
