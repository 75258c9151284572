//! Habit performance aggregation.

use std::sync::Arc;

use cadence_core::{HabitPerformance, PeriodKind, Task, TaskStatus, Trend, UserId};
use cadence_storage::Store;
use chrono::{Duration, NaiveDate};

use crate::runs::{active_run, longest_run, scan_runs};
use crate::Result;

/// Recomputes per-habit performance records from the completion ledger.
///
/// There is no incremental state: every call rebuilds the whole record, so
/// drift from missed updates disappears on the next call.
pub struct HabitAnalyzer<S> {
    store: Arc<S>,
}

/// Roll-up of all habit records for one user.
#[derive(Debug, Clone)]
pub struct HabitsSummary {
    /// Number of habits with a record
    pub total_habits: u32,
    /// Mean consistency rate, one decimal
    pub average_consistency: f64,
    /// Up to five habits at 80%+ consistency, best first
    pub best_habits: Vec<HabitPerformance>,
    /// Habits whose activity collapsed
    pub at_risk_habits: Vec<HabitPerformance>,
    /// Habits with clearly rising activity
    pub improving_habits: Vec<HabitPerformance>,
}

/// True-rate consistency for daily habits: distinct active days out of the
/// last 30, as a percentage capped at 100.
fn daily_consistency(distinct_active_days: u32) -> f64 {
    (distinct_active_days as f64 / 30.0 * 100.0).min(100.0)
}

/// Proxy consistency for non-daily habits: completions in the last 30 days
/// over a 30-day denominator, capped at 100.
///
/// Not dimensionally matched to weekly or monthly targets. Isolated here so
/// a period-aware rate can replace it without touching callers.
fn rolling_count_consistency(completions_last_30_days: u32) -> f64 {
    (completions_last_30_days as f64 / 30.0 * 100.0).min(100.0)
}

/// Compare the two halves of the last 30 days.
fn classify_trend(first_half: u32, second_half: u32) -> Trend {
    let first = first_half as f64;
    let second = second_half as f64;
    if second > first * 1.2 {
        Trend::Improving
    } else if second < first * 0.5 {
        Trend::AtRisk
    } else if second < first * 0.8 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

impl<S: Store> HabitAnalyzer<S> {
    /// Create an analyzer over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rebuild the performance record for one recurring task.
    ///
    /// Returns `None` for non-recurring tasks; they have no habit record.
    pub async fn update_habit_performance(
        &self,
        task: &Task,
        today: NaiveDate,
    ) -> Result<Option<HabitPerformance>> {
        let Some(rule) = &task.recurrence else {
            return Ok(None);
        };

        let events = self.store.completions_for_task(task.id).await?;
        let week_ago = today - Duration::days(7);
        let month_ago = today - Duration::days(30);
        let half_ago = today - Duration::days(15);
        let year_ago = today - Duration::days(365);

        let mut perf = HabitPerformance::new(task.id);
        perf.total_completions = events.len() as u32;
        perf.last_completion_date = events.last().map(|e| e.date());

        let mut dates: Vec<NaiveDate> = events.iter().map(|e| e.date()).collect();
        dates.dedup();

        for event in &events {
            let date = event.date();
            if date >= week_ago {
                perf.completions_last_7_days += 1;
            }
            if date >= month_ago {
                perf.completions_last_30_days += 1;
            }
            if date >= year_ago {
                *perf.completion_heatmap.entry(date).or_insert(0) += 1;
            }
        }

        perf.consistency_rate = if rule.period == PeriodKind::Daily {
            let active_days = dates.iter().filter(|d| **d >= month_ago).count() as u32;
            daily_consistency(active_days)
        } else {
            rolling_count_consistency(perf.completions_last_30_days)
        };

        let first_half = events
            .iter()
            .filter(|e| e.date() >= month_ago && e.date() < half_ago)
            .count() as u32;
        let second_half = events.iter().filter(|e| e.date() >= half_ago).count() as u32;
        perf.trend = classify_trend(first_half, second_half);

        let runs = scan_runs(&dates);
        perf.current_streak = active_run(&runs, today).map(|r| r.len).unwrap_or(0);
        perf.longest_streak = longest_run(&runs).map(|r| r.len).unwrap_or(0);

        self.store.save_habit_performance(&perf).await?;
        Ok(Some(perf))
    }

    /// Rebuild every habit record a user owns.
    ///
    /// A single task's failure is logged and skipped; it does not block the
    /// rest of the batch. Returns the number of records rebuilt.
    pub async fn refresh_all(&self, user_id: UserId, today: NaiveDate) -> Result<u32> {
        let mut refreshed = 0;
        for task in self.store.list_tasks(user_id).await? {
            if !task.is_recurring() || task.status == TaskStatus::Archived {
                continue;
            }
            match self.update_habit_performance(&task, today).await {
                Ok(Some(_)) => refreshed += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(task = %task.id, error = %e, "habit refresh failed, skipping");
                }
            }
        }
        Ok(refreshed)
    }

    /// Summarize the stored habit records for a user's active habits.
    pub async fn habits_summary(&self, user_id: UserId) -> Result<HabitsSummary> {
        let mut records = Vec::new();
        for task in self.store.list_tasks(user_id).await? {
            if !task.is_recurring() || task.status == TaskStatus::Archived {
                continue;
            }
            if let Some(perf) = self.store.load_habit_performance(task.id).await? {
                records.push(perf);
            }
        }

        let total = records.len() as u32;
        let average = if total > 0 {
            let sum: f64 = records.iter().map(|r| r.consistency_rate).sum();
            (sum / total as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };

        let mut best: Vec<HabitPerformance> = records
            .iter()
            .filter(|r| r.consistency_rate >= 80.0)
            .cloned()
            .collect();
        best.sort_by(|a, b| {
            b.consistency_rate
                .partial_cmp(&a.consistency_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        best.truncate(5);

        Ok(HabitsSummary {
            total_habits: total,
            average_consistency: average,
            best_habits: best,
            at_risk_habits: records
                .iter()
                .filter(|r| r.trend == Trend::AtRisk)
                .cloned()
                .collect(),
            improving_habits: records
                .iter()
                .filter(|r| r.trend == Trend::Improving)
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{CompletionEvent, RecurrenceRule, Time, UserId};
    use cadence_storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at_date(date: NaiveDate, h: u32) -> Time {
        Utc.from_utc_datetime(&date.and_hms_opt(h, 0, 0).unwrap())
    }

    async fn habit_with_completions(
        store: &Arc<MemoryStore>,
        user: UserId,
        period: PeriodKind,
        dates: &[NaiveDate],
    ) -> Task {
        let mut task = Task::new(user, "habit", at_date(d(2023, 1, 1), 6));
        task.recurrence = Some(RecurrenceRule::new(period));
        store.save_task(&task).await.unwrap();
        for date in dates {
            store
                .append_completion(&CompletionEvent::new(task.id, at_date(*date, 9)))
                .await
                .unwrap();
        }
        task
    }

    #[test]
    fn trend_thresholds() {
        assert_eq!(classify_trend(5, 7), Trend::Improving); // 7 > 6.0
        assert_eq!(classify_trend(10, 4), Trend::AtRisk); // 4 < 5.0
        assert_eq!(classify_trend(10, 7), Trend::Declining); // 7 < 8.0
        assert_eq!(classify_trend(10, 9), Trend::Stable);
        assert_eq!(classify_trend(0, 0), Trend::Stable);
        assert_eq!(classify_trend(0, 1), Trend::Improving);
    }

    #[test]
    fn consistency_rates_cap_at_100() {
        assert_eq!(daily_consistency(30), 100.0);
        assert_eq!(daily_consistency(15), 50.0);
        assert_eq!(rolling_count_consistency(90), 100.0);
        assert_eq!(rolling_count_consistency(15), 50.0);
    }

    #[tokio::test]
    async fn total_completions_matches_ledger_count() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 3, 31);
        let dates: Vec<NaiveDate> = (1..=9).map(|day| d(2024, 3, day)).collect();
        let task = habit_with_completions(&store, user, PeriodKind::Daily, &dates).await;

        let analyzer = HabitAnalyzer::new(Arc::clone(&store));
        let perf = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap()
            .unwrap();

        let ledger_count = store.completions_for_task(task.id).await.unwrap().len();
        assert_eq!(perf.total_completions as usize, ledger_count);
        assert_eq!(perf.last_completion_date, Some(d(2024, 3, 9)));
    }

    #[tokio::test]
    async fn daily_consistency_counts_distinct_days() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 3, 31);
        // 15 distinct days in the last 30, one day doubled.
        let mut dates: Vec<NaiveDate> = (10..25).map(|day| d(2024, 3, day)).collect();
        dates.push(d(2024, 3, 10));
        dates.sort();
        let task = habit_with_completions(&store, user, PeriodKind::Daily, &dates).await;

        let analyzer = HabitAnalyzer::new(store);
        let perf = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(perf.consistency_rate, 50.0);
        assert_eq!(perf.completions_last_30_days, 16);
    }

    #[tokio::test]
    async fn weekly_habit_uses_the_rolling_proxy() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 3, 31);
        let dates: Vec<NaiveDate> = (1..=6).map(|w| d(2024, 3, w * 5)).collect();
        let task = habit_with_completions(&store, user, PeriodKind::Weekly, &dates).await;

        let analyzer = HabitAnalyzer::new(store);
        let perf = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(perf.consistency_rate, rolling_count_consistency(6));
    }

    #[tokio::test]
    async fn heatmap_is_bounded_to_a_year() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 6, 1);
        let old = d(2022, 6, 1); // well past the window
        let recent = d(2024, 5, 20);
        let task =
            habit_with_completions(&store, user, PeriodKind::Daily, &[old, recent]).await;

        let analyzer = HabitAnalyzer::new(store);
        let perf = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap()
            .unwrap();
        assert!(!perf.completion_heatmap.contains_key(&old));
        assert_eq!(perf.completion_heatmap.get(&recent), Some(&1));
        // The old event still counts toward the all-time total.
        assert_eq!(perf.total_completions, 2);
    }

    #[tokio::test]
    async fn streaks_are_recomputed_not_ratcheted() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 3, 12);
        // A 4-day run long past, a 2-day run ending yesterday.
        let dates = [
            d(2024, 2, 1),
            d(2024, 2, 2),
            d(2024, 2, 3),
            d(2024, 2, 4),
            d(2024, 3, 10),
            d(2024, 3, 11),
        ];
        let task = habit_with_completions(&store, user, PeriodKind::Daily, &dates).await;

        let analyzer = HabitAnalyzer::new(store);
        let perf = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(perf.current_streak, 2);
        assert_eq!(perf.longest_streak, 4);
    }

    #[tokio::test]
    async fn update_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 3, 12);
        let dates = [d(2024, 3, 10), d(2024, 3, 11)];
        let task = habit_with_completions(&store, user, PeriodKind::Daily, &dates).await;

        let analyzer = HabitAnalyzer::new(store);
        let first = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap();
        let second = analyzer
            .update_habit_performance(&task, today)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn non_recurring_tasks_have_no_record() {
        let store = Arc::new(MemoryStore::new());
        let task = Task::new(UserId::new(), "one-off", at_date(d(2024, 1, 1), 6));
        let analyzer = HabitAnalyzer::new(store);
        let result = analyzer
            .update_habit_performance(&task, d(2024, 1, 2))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn refresh_all_covers_each_active_habit() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let today = d(2024, 3, 12);

        habit_with_completions(&store, user, PeriodKind::Daily, &[d(2024, 3, 11)]).await;
        habit_with_completions(&store, user, PeriodKind::Weekly, &[d(2024, 3, 10)]).await;
        // Archived habits are skipped.
        let mut archived = Task::new(user, "old habit", at_date(d(2024, 1, 1), 6));
        archived.recurrence = Some(RecurrenceRule::new(PeriodKind::Daily));
        archived.status = TaskStatus::Archived;
        store.save_task(&archived).await.unwrap();

        let analyzer = HabitAnalyzer::new(Arc::clone(&store));
        assert_eq!(analyzer.refresh_all(user, today).await.unwrap(), 2);

        let summary = analyzer.habits_summary(user).await.unwrap();
        assert_eq!(summary.total_habits, 2);
    }
}
