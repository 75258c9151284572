//! Calendar-aligned period calculation for recurring tasks.
//!
//! Everything here is a pure function of its arguments: a recurrence period
//! kind plus a reference instant in, a half-open `[start, end)` window out.
//! Callers must use one consistent "now" per evaluation or results can
//! flicker across a period boundary.

#![warn(missing_docs)]

mod period;

pub use period::{
    period_bounds, week_start, biweekly_start, month_start, quarter_start, year_start,
    week_bounds, month_bounds, PeriodWindow,
};
