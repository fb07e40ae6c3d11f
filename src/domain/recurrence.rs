/// Recurrence evaluation
///
/// Answers "is this habit due on this day?". Everything here is pure and
/// deterministic, so it can be called from any number of callers without
/// coordination.

use crate::domain::{CalendarDay, DateInput, HabitDefinition, RecurrenceKind, RecurrenceRule};

/// How far `next_due_date` looks ahead before giving up
///
/// Long enough to cover a monthly habit, a year-long interval, or a weekly
/// habit across any calendar layout.
const NEXT_DUE_HORIZON_DAYS: i64 = 400;

/// Whether `habit` is due on `date`
///
/// `date` may be a `CalendarDay`, a chrono date or timestamp, or text in
/// `yyyy-mm-dd` / `dd.mm.yyyy` form. Text that does not parse is never due.
pub fn is_due<D: DateInput>(habit: &HabitDefinition, date: D) -> bool {
    match date.to_calendar_day() {
        Some(day) => habit.recurrence.is_due_on(day),
        None => false,
    }
}

impl RecurrenceRule {
    /// Whether this rule makes `day` a due day
    pub fn is_due_on(&self, day: CalendarDay) -> bool {
        if day < self.start_date {
            return false;
        }

        let day_offset = day.days_since(self.start_date);

        // Active window is the half-open range [0, duration)
        if let Some(duration) = self.duration_days.filter(|d| *d > 0) {
            if day_offset >= i64::from(duration) {
                return false;
            }
        }

        match self.kind {
            RecurrenceKind::Daily => true,
            RecurrenceKind::Weekly => self.week_days.contains(&day.canonical_weekday()),
            RecurrenceKind::Monthly => {
                let expected_day = self.start_date.day_of_month().min(day.days_in_month());
                day.day_of_month() == expected_day
            }
            RecurrenceKind::Interval => {
                let interval = self.interval_days.filter(|i| *i >= 1).unwrap_or(1);
                day_offset % i64::from(interval) == 0
            }
        }
    }

    /// First due day on or after `from`, if any within the lookahead horizon
    ///
    /// Returns `None` once the active window has ended.
    pub fn next_due_date(&self, from: CalendarDay) -> Option<CalendarDay> {
        let first = from.max(self.start_date);

        (0..NEXT_DUE_HORIZON_DAYS)
            .map(|offset| first.add_days(offset))
            .find(|day| self.is_due_on(*day))
    }
}
