/// Source of "today"
///
/// Everything that needs the current date takes a `Clock` so tests can pin
/// the day instead of depending on when they run.

use chrono::Local;

use crate::domain::CalendarDay;

pub trait Clock: Send + Sync {
    /// The current local calendar day
    fn today(&self) -> CalendarDay;
}

/// Wall clock in the process's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDay {
        CalendarDay::from(Local::now())
    }
}

/// A clock stuck on one day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub CalendarDay);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDay {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn today(&self) -> CalendarDay {
        (**self).today()
    }
}
