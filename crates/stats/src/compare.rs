//! Period-over-period comparison.

use std::sync::Arc;

use cadence_core::{BucketKind, PeriodComparison, UserId};
use cadence_recurrence::{month_bounds, week_bounds};
use cadence_storage::Store;
use chrono::NaiveDate;

use crate::Result;

/// Result of comparing the current bucket with the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// The current, freshly rebuilt bucket
    pub current: PeriodComparison,
    /// The most recent prior bucket, if any exists
    pub previous: Option<PeriodComparison>,
    /// Completed-task delta vs the previous bucket
    pub tasks_change: i64,
    /// Completed-task percent change (0 when there is no baseline)
    pub tasks_change_percent: f64,
    /// Habit-completion delta
    pub habits_change: i64,
    /// Habit-completion percent change
    pub habits_change_percent: f64,
    /// Time-spent delta
    pub time_change: f64,
    /// Time-spent percent change
    pub time_change_percent: f64,
    /// True iff neither tasks nor habits decreased
    pub is_improvement: bool,
    /// Short natural-language summary
    pub summary: String,
}

/// Aggregates daily records into week/month buckets and compares them.
pub struct PeriodComparator<S> {
    store: Arc<S>,
}

fn bucket_bounds(kind: BucketKind, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match kind {
        BucketKind::Week => week_bounds(date),
        BucketKind::Month => month_bounds(date),
    }
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl<S: Store> PeriodComparator<S> {
    /// Create a comparator over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rebuild the bucket containing `anchor` from daily aggregates.
    pub async fn update_bucket(
        &self,
        user_id: UserId,
        kind: BucketKind,
        anchor: NaiveDate,
    ) -> Result<PeriodComparison> {
        let (start, end) = bucket_bounds(kind, anchor);
        let mut bucket = PeriodComparison::new(user_id, kind, start, end);

        for day in self.store.daily_range(user_id, start, end).await? {
            bucket.tasks_completed += day.tasks_completed;
            bucket.tasks_created += day.tasks_created;
            bucket.habit_completions += day.habit_completions;
            bucket.time_spent += day.time_spent;
            bucket.milestones_completed += day.milestones_completed;
        }

        bucket.productivity_score = (bucket.tasks_completed * 10
            + bucket.habit_completions * 5
            + bucket.milestones_completed * 20)
            .min(100);

        if let Some(prev) = self
            .store
            .latest_comparison_before(user_id, kind, start)
            .await?
        {
            bucket.tasks_change_percent = round1(percent_change(
                bucket.tasks_completed as f64,
                prev.tasks_completed as f64,
            ));
        }

        self.store.save_comparison(&bucket).await?;
        Ok(bucket)
    }

    /// Compare the bucket containing `today` with the most recent one
    /// before it.
    pub async fn compare_periods(
        &self,
        user_id: UserId,
        kind: BucketKind,
        today: NaiveDate,
    ) -> Result<ComparisonResult> {
        let current = self.update_bucket(user_id, kind, today).await?;
        let previous = self
            .store
            .latest_comparison_before(user_id, kind, current.period_start)
            .await?;

        let prev_tasks = previous.as_ref().map(|p| p.tasks_completed).unwrap_or(0);
        let prev_habits = previous.as_ref().map(|p| p.habit_completions).unwrap_or(0);
        let prev_time = previous.as_ref().map(|p| p.time_spent).unwrap_or(0.0);

        let tasks_change = current.tasks_completed as i64 - prev_tasks as i64;
        let habits_change = current.habit_completions as i64 - prev_habits as i64;
        let time_change = current.time_spent - prev_time;
        let is_improvement = tasks_change >= 0 && habits_change >= 0;

        let summary = if is_improvement {
            format!(
                "Great job! You completed {} more tasks than last {}.",
                tasks_change, kind
            )
        } else {
            format!(
                "You completed {} fewer tasks than last {}. Keep going!",
                tasks_change.abs(),
                kind
            )
        };

        Ok(ComparisonResult {
            tasks_change,
            tasks_change_percent: round1(percent_change(
                current.tasks_completed as f64,
                prev_tasks as f64,
            )),
            habits_change,
            habits_change_percent: round1(percent_change(
                current.habit_completions as f64,
                prev_habits as f64,
            )),
            time_change,
            time_change_percent: round1(percent_change(current.time_spent, prev_time)),
            is_improvement,
            summary,
            current,
            previous,
        })
    }
}
