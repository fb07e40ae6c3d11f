/// Main entry point for the habit streak engine
///
/// This file sets up logging, parses command line arguments and the optional
/// config file, then either runs the midnight scheduler until Ctrl-C or
/// performs a single pass and exits.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use habit_streak_engine::actions::{get_streak_status, StatusParams};
use habit_streak_engine::config::{default_database_path, Config};
use habit_streak_engine::{CalendarDay, HabitEngine, HabitStorage};

/// Command line arguments for the habit streak engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses the config file or a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Path to a JSON config file (defaults to ~/.habit_streaks/config.json if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daily pass at every local midnight until interrupted (default)
    Run {
        /// Skip running today's daily pass on startup
        #[arg(long)]
        no_startup_reconcile: bool,
    },
    /// Create missing tracking entries for one day
    Reconcile {
        /// yyyy-mm-dd or dd.mm.yyyy, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Recompute habit and aggregate streaks as of one day
    Refresh {
        #[arg(long)]
        date: Option<String>,
    },
    /// Print streak status as JSON
    Status {
        /// Only this user; all users when omitted
        #[arg(long)]
        user: Option<String>,
    },
}

fn parse_date_arg(raw: Option<String>, today: CalendarDay) -> Result<CalendarDay, Box<dyn std::error::Error>> {
    match raw {
        Some(text) => Ok(CalendarDay::parse(&text)?),
        None => Ok(today),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    // Set up logging based on command line flags, then the config file
    let log_filter = if args.verbose {
        "habit_streak_engine=debug".to_string()
    } else if args.debug {
        "habit_streak_engine=info".to_string()
    } else {
        config
            .log_filter
            .clone()
            .unwrap_or_else(|| "habit_streak_engine=warn".to_string())
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_filter))
        .with_writer(std::io::stderr) // stdout is reserved for JSON output
        .init();

    // Determine database path
    let db_path = match args.database.or_else(|| config.database_path.clone()) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());
    let engine = HabitEngine::open(db_path)?;

    match args.command.unwrap_or(Command::Run { no_startup_reconcile: false }) {
        Command::Run { no_startup_reconcile } => {
            let reconcile = config.reconcile_on_startup && !no_startup_reconcile;

            tokio::select! {
                _ = engine.run(reconcile) => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Received Ctrl-C, stopping scheduler");
                }
            }
        }
        Command::Reconcile { date } => {
            let date = parse_date_arg(date, engine.today())?;
            let report = engine.reconcile(date)?;
            let output = serde_json::json!({
                "date": date,
                "created": report.created.len(),
                "not_due": report.not_due,
                "already_present": report.already_present,
                "failures": report.failures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Refresh { date } => {
            let date = parse_date_arg(date, engine.today())?;
            let report = engine.refresh_streaks(date)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Status { user } => {
            let users = match user {
                Some(user_id) => vec![user_id],
                None => engine
                    .storage()
                    .list_user_ids()?
                    .into_iter()
                    .map(|id| id.to_string())
                    .collect(),
            };

            let mut statuses = Vec::with_capacity(users.len());
            for user_id in users {
                let params = StatusParams { user_id, habit_id: None };
                statuses.push(get_streak_status(engine.storage(), engine.clock(), params)?);
            }
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
    }

    info!("Habit streak engine shutdown complete");
    Ok(())
}
