//! Period boundary calculation.

use cadence_core::{PeriodKind, Time};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// First instant of the period (inclusive)
    pub start: Time,
    /// First instant of the next period (exclusive)
    pub end: Time,
}

impl PeriodWindow {
    /// Whether an instant falls inside the window.
    pub fn contains(&self, t: Time) -> bool {
        t >= self.start && t < self.end
    }
}

/// Compute the current period window for a recurrence kind.
///
/// Periods are anchored to calendar boundaries regardless of when the task
/// was created or when the function is called:
/// - daily: midnight of `now`'s date, one day long
/// - weekly: Monday of `now`'s ISO week, seven days
/// - biweekly: a fixed global two-week grid keyed by ISO week parity; an
///   odd-numbered week belongs to the period that started the previous Monday
/// - monthly / quarterly / yearly: the 1st of the month, quarter (Jan, Apr,
///   Jul, Oct), or year
pub fn period_bounds(kind: PeriodKind, now: Time) -> PeriodWindow {
    let today = now.date_naive();

    match kind {
        PeriodKind::Daily => {
            let start = midnight(today);
            PeriodWindow {
                start,
                end: start + Duration::days(1),
            }
        }
        PeriodKind::Weekly => {
            let start = midnight(week_start(today));
            PeriodWindow {
                start,
                end: start + Duration::days(7),
            }
        }
        PeriodKind::Biweekly => {
            let start = midnight(biweekly_start(today));
            PeriodWindow {
                start,
                end: start + Duration::days(14),
            }
        }
        PeriodKind::Monthly => {
            let start = month_start(today);
            PeriodWindow {
                start: midnight(start),
                end: midnight(months_after(start, 1)),
            }
        }
        PeriodKind::Quarterly => {
            let start = quarter_start(today);
            PeriodWindow {
                start: midnight(start),
                end: midnight(months_after(start, 3)),
            }
        }
        PeriodKind::Yearly => {
            let start = year_start(today);
            PeriodWindow {
                start: midnight(start),
                end: midnight(months_after(start, 12)),
            }
        }
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Start of the two-week grid period containing `date`.
///
/// The grid is keyed by ISO week number parity: even-numbered weeks open a
/// period, odd-numbered weeks belong to the period opened the week before.
/// Two biweekly tasks created on different days therefore share the same
/// global boundaries.
pub fn biweekly_start(date: NaiveDate) -> NaiveDate {
    let monday = week_start(date);
    if date.iso_week().week() % 2 == 1 {
        monday - Duration::days(7)
    } else {
        monday
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// First day of the quarter containing `date` (Jan, Apr, Jul, Oct).
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let months_into_quarter = (date.month0() % 3) as i32;
    months_after(month_start(date), -months_into_quarter)
}

/// January 1st of the year containing `date`.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    months_after(month_start(date), -(date.month0() as i32))
}

/// Inclusive date bounds of the Monday-aligned week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start + Duration::days(6))
}

/// Inclusive date bounds of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = month_start(date);
    (start, months_after(start, 1) - Duration::days(1))
}

/// Midnight (00:00:00 UTC) of a calendar date.
fn midnight(date: NaiveDate) -> Time {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Shift a first-of-month date by whole calendar months.
fn months_after(first_of_month: NaiveDate, months: i32) -> NaiveDate {
    let total = first_of_month.year() * 12 + first_of_month.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    // Day 1 exists in every month
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month")
}
