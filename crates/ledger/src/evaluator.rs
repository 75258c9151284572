//! Period completion evaluation.

use std::sync::Arc;

use cadence_core::{Task, TaskStatus, Time};
use cadence_recurrence::{period_bounds, PeriodWindow};
use cadence_storage::Store;

use super::{CompletionLedger, Result};

/// Progress of a task inside one period, in the units its target uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeriodProgress {
    /// Completion-count semantics
    Count {
        /// Completions recorded in the window
        completed: u32,
        /// Required completions
        target: u32,
    },
    /// Accumulated-value semantics
    Value {
        /// Summed value recorded in the window (events without a value
        /// contribute 0)
        accumulated: f64,
        /// Required accumulated value
        target: f64,
    },
}

impl PeriodProgress {
    /// Whether the target has been met.
    pub fn is_complete(&self) -> bool {
        match *self {
            PeriodProgress::Count { completed, target } => completed >= target,
            PeriodProgress::Value {
                accumulated,
                target,
            } => accumulated >= target,
        }
    }

    /// How much is still missing, `max(0, target - progress)`.
    pub fn remaining(&self) -> f64 {
        match *self {
            PeriodProgress::Count { completed, target } => {
                target.saturating_sub(completed) as f64
            }
            PeriodProgress::Value {
                accumulated,
                target,
            } => (target - accumulated).max(0.0),
        }
    }
}

/// Evaluates a task's progress against its target in the current period.
///
/// All methods take an explicit `now`; a single evaluation must use one
/// consistent instant or results can flicker across a period boundary.
pub struct PeriodEvaluator<S> {
    ledger: CompletionLedger<S>,
}

impl<S: Store> PeriodEvaluator<S> {
    /// Create an evaluator over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            ledger: CompletionLedger::new(store),
        }
    }

    /// The current period window, or None for non-recurring tasks.
    pub fn current_window(&self, task: &Task, now: Time) -> Option<PeriodWindow> {
        task.recurrence
            .as_ref()
            .map(|rule| period_bounds(rule.period, now))
    }

    /// Progress against the target in the current period.
    ///
    /// Non-recurring tasks degrade to count semantics over their one-off
    /// completion: 0 or 1 of 1.
    pub async fn progress_in_period(&self, task: &Task, now: Time) -> Result<PeriodProgress> {
        let Some(rule) = &task.recurrence else {
            let completed = (task.status == TaskStatus::Completed) as u32;
            return Ok(PeriodProgress::Count {
                completed,
                target: 1,
            });
        };

        let window = period_bounds(rule.period, now);
        let events = self.ledger.completions_in(task.id, window).await?;

        if let Some(target) = rule.target_value {
            let accumulated = events.iter().filter_map(|e| e.value).sum();
            Ok(PeriodProgress::Value {
                accumulated,
                target,
            })
        } else {
            Ok(PeriodProgress::Count {
                completed: events.len() as u32,
                target: rule.target_count.max(1),
            })
        }
    }

    /// Whether the task has met its target for the current period.
    pub async fn is_period_complete(&self, task: &Task, now: Time) -> Result<bool> {
        Ok(self.progress_in_period(task, now).await?.is_complete())
    }

    /// Count or value still needed this period.
    pub async fn remaining_in_period(&self, task: &Task, now: Time) -> Result<f64> {
        Ok(self.progress_in_period(task, now).await?.remaining())
    }

    /// Number of completions recorded in the current period.
    pub async fn completions_in_current_period(&self, task: &Task, now: Time) -> Result<u32> {
        match self.current_window(task, now) {
            Some(window) => Ok(self.ledger.completions_in(task.id, window).await?.len() as u32),
            None => Ok(0),
        }
    }

    /// Most recent completion instant: the last ledger event for recurring
    /// tasks, `completed_at` for one-off tasks.
    pub async fn last_completion(&self, task: &Task) -> Result<Option<Time>> {
        if !task.is_recurring() {
            return Ok(task.completed_at);
        }
        let history = self.ledger.history(task.id).await?;
        Ok(history.last().map(|e| e.occurred_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{PeriodKind, RecurrenceRule, UserId};
    use cadence_storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> Time {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    async fn recurring_task(rule: RecurrenceRule) -> (Arc<MemoryStore>, Task) {
        let store = Arc::new(MemoryStore::new());
        let mut task = Task::new(UserId::new(), "german practice", at(2024, 3, 1, 8));
        task.recurrence = Some(rule);
        store.save_task(&task).await.unwrap();
        (store, task)
    }

    #[tokio::test]
    async fn weekly_count_target_reports_remaining() {
        // Three times a week, two done so far this ISO week.
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_count(3);
        let (store, task) = recurring_task(rule).await;
        let ledger = CompletionLedger::new(Arc::clone(&store));
        let eval = PeriodEvaluator::new(store);

        // 2024-03-11 is the Monday of ISO week 11.
        ledger
            .record(task.id, at(2024, 3, 11, 7), None, None)
            .await
            .unwrap();
        ledger
            .record(task.id, at(2024, 3, 12, 7), None, None)
            .await
            .unwrap();

        let now = at(2024, 3, 13, 12);
        assert!(!eval.is_period_complete(&task, now).await.unwrap());
        assert_eq!(eval.remaining_in_period(&task, now).await.unwrap(), 1.0);
        assert_eq!(
            eval.completions_in_current_period(&task, now).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn completions_from_a_previous_week_do_not_count() {
        let rule = RecurrenceRule::new(PeriodKind::Weekly);
        let (store, task) = recurring_task(rule).await;
        let ledger = CompletionLedger::new(Arc::clone(&store));
        let eval = PeriodEvaluator::new(store);

        // Sunday of ISO week 10.
        ledger
            .record(task.id, at(2024, 3, 10, 22), None, None)
            .await
            .unwrap();

        let now = at(2024, 3, 13, 12);
        assert!(!eval.is_period_complete(&task, now).await.unwrap());
    }

    #[tokio::test]
    async fn value_target_sums_and_treats_missing_value_as_zero() {
        let rule = RecurrenceRule::new(PeriodKind::Daily).with_target_value(30.0);
        let (store, task) = recurring_task(rule).await;
        let ledger = CompletionLedger::new(Arc::clone(&store));
        let eval = PeriodEvaluator::new(store);

        ledger
            .record(task.id, at(2024, 3, 13, 8), Some(10.0), None)
            .await
            .unwrap();
        // No value: contributes nothing toward the 30.
        ledger
            .record(task.id, at(2024, 3, 13, 12), None, None)
            .await
            .unwrap();

        let now = at(2024, 3, 13, 14);
        assert!(!eval.is_period_complete(&task, now).await.unwrap());
        assert_eq!(eval.remaining_in_period(&task, now).await.unwrap(), 20.0);

        ledger
            .record(task.id, at(2024, 3, 13, 20), Some(25.0), None)
            .await
            .unwrap();
        assert!(eval.is_period_complete(&task, now).await.unwrap());
        assert_eq!(eval.remaining_in_period(&task, now).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn completion_is_monotonic_in_events() {
        let rule = RecurrenceRule::new(PeriodKind::Weekly).with_target_count(2);
        let (store, task) = recurring_task(rule).await;
        let ledger = CompletionLedger::new(Arc::clone(&store));
        let eval = PeriodEvaluator::new(store);

        let now = at(2024, 3, 13, 12);
        let mut was_complete = false;
        for day in 11..=17 {
            ledger
                .record(task.id, at(2024, 3, day, 9), None, None)
                .await
                .unwrap();
            let complete = eval.is_period_complete(&task, now).await.unwrap();
            assert!(
                !was_complete || complete,
                "adding an event turned a complete period incomplete"
            );
            was_complete = complete;
        }
        assert!(was_complete);
    }

    #[tokio::test]
    async fn non_recurring_degrades_to_done_check() {
        let store = Arc::new(MemoryStore::new());
        let mut task = Task::new(UserId::new(), "file taxes", at(2024, 3, 1, 8));
        store.save_task(&task).await.unwrap();
        let eval = PeriodEvaluator::new(Arc::clone(&store));

        let now = at(2024, 3, 13, 12);
        assert!(eval.current_window(&task, now).is_none());
        assert!(!eval.is_period_complete(&task, now).await.unwrap());
        assert_eq!(eval.remaining_in_period(&task, now).await.unwrap(), 1.0);

        task.mark_completed(at(2024, 3, 13, 10));
        assert!(eval.is_period_complete(&task, now).await.unwrap());
        assert_eq!(eval.remaining_in_period(&task, now).await.unwrap(), 0.0);
        assert_eq!(
            eval.last_completion(&task).await.unwrap(),
            Some(at(2024, 3, 13, 10))
        );
    }
}
