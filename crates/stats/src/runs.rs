//! Consecutive-date run scanning shared by the streak paths.

use chrono::{Duration, NaiveDate};

/// A maximal run of consecutive calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub len: u32,
}

/// Split sorted, distinct dates into maximal consecutive runs.
pub(crate) fn scan_runs(dates: &[NaiveDate]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut iter = dates.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };

    let mut start = first;
    let mut prev = first;
    for date in iter {
        if date - prev == Duration::days(1) {
            prev = date;
            continue;
        }
        runs.push(make_run(start, prev));
        start = date;
        prev = date;
    }
    runs.push(make_run(start, prev));
    runs
}

fn make_run(start: NaiveDate, end: NaiveDate) -> Run {
    Run {
        start,
        end,
        len: (end - start).num_days() as u32 + 1,
    }
}

/// First run holding the maximum length; ties keep the earlier run.
pub(crate) fn longest_run(runs: &[Run]) -> Option<Run> {
    let mut best: Option<Run> = None;
    for run in runs {
        if best.map(|b| run.len > b.len).unwrap_or(true) {
            best = Some(*run);
        }
    }
    best
}

/// The final run, if it is still alive (ends today or yesterday).
pub(crate) fn active_run(runs: &[Run], today: NaiveDate) -> Option<Run> {
    runs.last()
        .filter(|run| run.end >= today - Duration::days(1))
        .copied()
}
