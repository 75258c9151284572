//! Daily productivity aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;

use cadence_core::{DailyAggregate, TaskStatus, Time, UserId};
use cadence_storage::Store;
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};

use crate::Result;

/// Rebuilds the per-day aggregate a user's charts and comparisons read.
pub struct DailyAggregator<S> {
    store: Arc<S>,
}

/// Roll-up of a date range of daily aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductivitySummary {
    /// First date of the range
    pub period_start: NaiveDate,
    /// Last date of the range (inclusive)
    pub period_end: NaiveDate,
    /// Tasks completed across the range
    pub total_tasks_completed: u32,
    /// Recurring completions across the range
    pub total_habit_completions: u32,
    /// Total recorded value across the range
    pub total_time_spent: f64,
    /// Mean tasks per day, one decimal
    pub average_tasks_per_day: f64,
    /// Hour of day with the most completions
    pub peak_hour: Option<u8>,
    /// Completions in the peak hour
    pub peak_hour_count: u32,
    /// Date with the most completed tasks
    pub best_day: Option<NaiveDate>,
    /// Completed tasks on the best day
    pub best_day_count: u32,
    /// The raw daily records, ordered by date
    pub daily: Vec<DailyAggregate>,
}

fn day_window(date: NaiveDate) -> (Time, Time) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

impl<S: Store> DailyAggregator<S> {
    /// Create an aggregator over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rebuild the aggregate for one (user, date) from source data.
    ///
    /// The record is overwritten wholesale, so re-running after a partial
    /// failure or a late-arriving event lands on the same result.
    pub async fn update_daily(&self, user_id: UserId, date: NaiveDate) -> Result<DailyAggregate> {
        let (day_start, day_end) = day_window(date);
        let mut aggregate = DailyAggregate::new(user_id, date);
        let mut by_hour: BTreeMap<u8, u32> = BTreeMap::new();

        // Recurring completions recorded that day
        for event in self.store.completions_for_user(user_id).await? {
            if event.occurred_at < day_start || event.occurred_at >= day_end {
                continue;
            }
            aggregate.habit_completions += 1;
            aggregate.time_spent += event.value.unwrap_or(0.0);
            *by_hour.entry(event.occurred_at.hour() as u8).or_insert(0) += 1;
        }

        // One-off tasks completed that day, plus creations
        let mut one_off_done = 0u32;
        for task in self.store.list_tasks(user_id).await? {
            if task.created_at >= day_start && task.created_at < day_end {
                aggregate.tasks_created += 1;
            }
            if task.is_recurring() || task.status != TaskStatus::Completed {
                continue;
            }
            if let Some(done) = task.completed_at {
                if done >= day_start && done < day_end {
                    one_off_done += 1;
                    *by_hour.entry(done.hour() as u8).or_insert(0) += 1;
                }
            }
        }
        aggregate.tasks_completed = aggregate.habit_completions + one_off_done;
        aggregate.completions_by_hour = by_hour;

        // Milestones completed that day
        for goal in self.store.list_goals(user_id).await? {
            for milestone in self.store.list_milestones(goal.id).await? {
                if let Some(done) = milestone.completed_at {
                    if done >= day_start && done < day_end {
                        aggregate.milestones_completed += 1;
                    }
                }
            }
        }

        self.store.save_daily(&aggregate).await?;
        Ok(aggregate)
    }

    /// Summarize a date range: totals, daily average, peak hour, best day.
    pub async fn summary(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProductivitySummary> {
        let records = self.store.daily_range(user_id, start, end).await?;

        let total_tasks: u32 = records.iter().map(|r| r.tasks_completed).sum();
        let total_habits: u32 = records.iter().map(|r| r.habit_completions).sum();
        let total_time: f64 = records.iter().map(|r| r.time_spent).sum();

        let days = (end - start).num_days() + 1;
        let average = if days > 0 {
            (total_tasks as f64 / days as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };

        let mut hour_totals: BTreeMap<u8, u32> = BTreeMap::new();
        for record in &records {
            for (hour, count) in &record.completions_by_hour {
                *hour_totals.entry(*hour).or_insert(0) += count;
            }
        }
        let mut peak_hour = None;
        let mut peak_count = 0;
        for (hour, count) in &hour_totals {
            if *count > peak_count {
                peak_hour = Some(*hour);
                peak_count = *count;
            }
        }

        let mut best_day = None;
        let mut best_count = 0;
        for record in &records {
            if record.tasks_completed > best_count {
                best_count = record.tasks_completed;
                best_day = Some(record.date);
            }
        }

        Ok(ProductivitySummary {
            period_start: start,
            period_end: end,
            total_tasks_completed: total_tasks,
            total_habit_completions: total_habits,
            total_time_spent: total_time,
            average_tasks_per_day: average,
            peak_hour,
            peak_hour_count: peak_count,
            best_day,
            best_day_count: best_count,
            daily: records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{CompletionEvent, Milestone, PeriodKind, RecurrenceRule, Task};
    use cadence_storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn at(m: u32, day: u32, h: u32) -> Time {
        Utc.with_ymd_and_hms(2024, m, day, h, 0, 0).unwrap()
    }

    async fn seeded_store(user: UserId) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());

        let mut habit = Task::new(user, "journal", at(1, 1, 6));
        habit.recurrence = Some(RecurrenceRule::new(PeriodKind::Daily));
        store.save_task(&habit).await.unwrap();

        store
            .append_completion(&CompletionEvent::new(habit.id, at(1, 10, 7)).with_value(15.0))
            .await
            .unwrap();
        store
            .append_completion(&CompletionEvent::new(habit.id, at(1, 10, 21)).with_value(10.0))
            .await
            .unwrap();
        // A different day; must not leak into the 10th.
        store
            .append_completion(&CompletionEvent::new(habit.id, at(1, 11, 7)))
            .await
            .unwrap();

        let mut chore = Task::new(user, "fix bike", at(1, 10, 9));
        chore.mark_completed(at(1, 10, 21));
        store.save_task(&chore).await.unwrap();

        let goal = cadence_core::Goal {
            id: cadence_core::GoalId::new(),
            user_id: user,
            title: "ride more".into(),
            description: String::new(),
            status: cadence_core::GoalStatus::Active,
            start_date: Some(d(1, 1)),
            target_date: Some(d(3, 1)),
            created_at: at(1, 1, 6),
            updated_at: at(1, 1, 6),
        };
        store.save_goal(&goal).await.unwrap();
        let mut milestone = Milestone::new(goal.id, "first 100km");
        milestone.complete(at(1, 10, 18));
        store.save_milestone(&milestone).await.unwrap();

        store
    }

    #[tokio::test]
    async fn aggregate_counts_all_sources() {
        let user = UserId::new();
        let store = seeded_store(user).await;
        let aggregator = DailyAggregator::new(store);

        let agg = aggregator.update_daily(user, d(1, 10)).await.unwrap();
        assert_eq!(agg.habit_completions, 2);
        assert_eq!(agg.tasks_completed, 3);
        assert_eq!(agg.tasks_created, 1); // the chore was created on the 10th
        assert_eq!(agg.time_spent, 25.0);
        assert_eq!(agg.milestones_completed, 1);
        // 7h: one habit; 21h: habit + chore
        assert_eq!(agg.completions_by_hour.get(&7), Some(&1));
        assert_eq!(agg.completions_by_hour.get(&21), Some(&2));
    }

    #[tokio::test]
    async fn update_daily_is_idempotent() {
        let user = UserId::new();
        let store = seeded_store(user).await;
        let aggregator = DailyAggregator::new(store);

        let first = aggregator.update_daily(user, d(1, 10)).await.unwrap();
        let second = aggregator.update_daily(user, d(1, 10)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn summary_finds_peak_hour_and_best_day() {
        let user = UserId::new();
        let store = seeded_store(user).await;
        let aggregator = DailyAggregator::new(store);

        aggregator.update_daily(user, d(1, 10)).await.unwrap();
        aggregator.update_daily(user, d(1, 11)).await.unwrap();

        let summary = aggregator.summary(user, d(1, 10), d(1, 11)).await.unwrap();
        assert_eq!(summary.total_tasks_completed, 4);
        assert_eq!(summary.total_habit_completions, 3);
        assert_eq!(summary.average_tasks_per_day, 2.0);
        assert_eq!(summary.peak_hour, Some(7)); // 7h ties 21h at 2; earlier hour wins
        assert_eq!(summary.peak_hour_count, 2);
        assert_eq!(summary.best_day, Some(d(1, 10)));
        assert_eq!(summary.best_day_count, 3);
        assert_eq!(summary.daily.len(), 2);
    }

    #[tokio::test]
    async fn empty_day_produces_a_zero_record() {
        let user = UserId::new();
        let store = seeded_store(user).await;
        let aggregator = DailyAggregator::new(store);

        let agg = aggregator.update_daily(user, d(2, 1)).await.unwrap();
        assert_eq!(agg.tasks_completed, 0);
        assert!(agg.completions_by_hour.is_empty());
    }
}
