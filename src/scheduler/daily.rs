/// Local-midnight trigger
///
/// Runs a task once per local calendar day. The loop wakes at least every
/// `MAX_SLEEP_SECONDS` and compares the clock's day against the last day it
/// ran for, so suspends, DST shifts and manual clock changes are picked up on
/// the next wake rather than relying on one long sleep.

use std::fmt::Display;

use chrono::{DateTime, Duration as ChronoDuration, Local, LocalResult, NaiveTime, TimeZone};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::clock::Clock;
use crate::domain::CalendarDay;

/// Upper bound on a single sleep between day checks
pub const MAX_SLEEP_SECONDS: u64 = 60;

/// Time from `now` until the next local midnight
pub fn duration_until_next_midnight(now: DateTime<Local>) -> Duration {
    let tomorrow = now.date_naive() + ChronoDuration::days(1);
    let midnight = tomorrow.and_time(NaiveTime::MIN);

    let next = match Local.from_local_datetime(&midnight) {
        LocalResult::Single(at) => at,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Midnight skipped by a DST jump; the first instant of the day is an hour later
        LocalResult::None => match Local.from_local_datetime(&(midnight + ChronoDuration::hours(1))) {
            LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at,
            LocalResult::None => return Duration::from_secs(MAX_SLEEP_SECONDS),
        },
    };

    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// How long the loop should sleep before checking the day again
fn next_sleep(now: DateTime<Local>) -> Duration {
    duration_until_next_midnight(now)
        .min(Duration::from_secs(MAX_SLEEP_SECONDS))
        .max(Duration::from_secs(1))
}

/// Run `task` for each new local day after `last_run`
///
/// Never returns on its own; callers race it against a shutdown signal. A
/// failing run is logged and the loop moves on to the next day.
pub async fn run_daily<C, F, T, E>(clock: &C, mut last_run: CalendarDay, mut task: F)
where
    C: Clock + ?Sized,
    F: FnMut(CalendarDay) -> Result<T, E>,
    E: Display,
{
    info!(last_run = %last_run, "Daily scheduler started");

    loop {
        let today = clock.today();

        if today > last_run {
            info!(date = %today, "Local day changed, running daily pass");
            if let Err(e) = task(today) {
                error!(date = %today, error = %e, "Daily pass failed");
            }
            last_run = today;
        }

        sleep(next_sleep(Local::now())).await;
    }
}
