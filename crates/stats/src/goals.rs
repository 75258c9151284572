//! Goal velocity and completion projection.

use std::sync::Arc;

use cadence_core::{
    Goal, GoalProgress, MilestoneStatus, TaskStatus, UserId, VelocityTrend,
};
use cadence_storage::Store;
use chrono::{Duration, NaiveDate};

use crate::Result;

/// Recomputes goal progress records: milestone counts, velocity, projected
/// completion, and the on-track flag.
pub struct GoalProjector<S> {
    store: Arc<S>,
}

impl<S: Store> GoalProjector<S> {
    /// Create a projector over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rebuild the progress record for one goal.
    pub async fn update_goal_progress(&self, goal: &Goal, today: NaiveDate) -> Result<GoalProgress> {
        let milestones = self.store.list_milestones(goal.id).await?;
        let mut progress = GoalProgress::new(goal.id);

        progress.milestones_total = milestones.len() as u32;
        progress.milestones_completed = milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Completed)
            .count() as u32;

        if progress.milestones_total > 0 {
            progress.progress_percentage =
                progress.milestones_completed as f64 / progress.milestones_total as f64 * 100.0;
        }

        // Tasks linked through milestones
        for milestone in &milestones {
            for task_id in &milestone.tasks {
                progress.tasks_total += 1;
                if let Some(task) = self.store.load_task(*task_id).await? {
                    if task.status == TaskStatus::Completed {
                        progress.tasks_completed += 1;
                    }
                }
            }
        }

        // Last milestone activity
        let last_activity = milestones
            .iter()
            .filter_map(|m| m.completed_at)
            .max()
            .map(|t| t.date_naive());
        progress.last_activity_date = last_activity;
        // With no milestone activity yet, idleness is measured from the
        // goal's start date.
        progress.days_since_activity = match last_activity.or(goal.start_date) {
            Some(anchor) => (today - anchor).num_days().max(0) as u32,
            None => 0,
        };

        // Velocity and projections need a timeline
        if let (Some(start), Some(target)) = (goal.start_date, goal.target_date) {
            let total_days = (target - start).num_days();
            let days_elapsed = (today - start).num_days();

            if days_elapsed > 0 && total_days > 0 {
                progress.velocity = progress.progress_percentage / days_elapsed as f64;

                if progress.velocity > 0.0 {
                    let remaining = 100.0 - progress.progress_percentage;
                    let days_needed = (remaining / progress.velocity).ceil() as i64;
                    progress.estimated_completion_date = Some(today + Duration::days(days_needed));
                }

                let expected = days_elapsed as f64 / total_days as f64 * 100.0;
                let diff = progress.progress_percentage - expected;
                progress.days_ahead_or_behind = (diff * total_days as f64 / 100.0) as i32;
                progress.on_track = diff >= -10.0;
            }
        }

        // Coarse velocity classification from recent milestone completions
        let recent = milestones
            .iter()
            .filter_map(|m| m.completed_at)
            .filter(|t| t.date_naive() >= today - Duration::days(14))
            .count();
        progress.velocity_trend = if recent > 0 {
            VelocityTrend::Steady
        } else if progress.days_since_activity > 7 {
            VelocityTrend::Stalled
        } else {
            VelocityTrend::Steady
        };

        self.store.save_goal_progress(&progress).await?;
        Ok(progress)
    }

    /// Rebuild every goal record a user owns; one goal's failure is logged
    /// and skipped rather than blocking the batch.
    pub async fn refresh_all(&self, user_id: UserId, today: NaiveDate) -> Result<u32> {
        let mut refreshed = 0;
        for goal in self.store.list_goals(user_id).await? {
            match self.update_goal_progress(&goal, today).await {
                Ok(_) => refreshed += 1,
                Err(e) => {
                    tracing::warn!(goal = %goal.id, error = %e, "goal refresh failed, skipping");
                }
            }
        }
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{GoalStatus, Milestone, Task, Time};
    use cadence_storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn at(m: u32, day: u32, h: u32) -> Time {
        Utc.with_ymd_and_hms(2024, m, day, h, 0, 0).unwrap()
    }

    fn goal_with_dates(user: UserId, start: NaiveDate, target: NaiveDate) -> Goal {
        Goal {
            id: cadence_core::GoalId::new(),
            user_id: user,
            title: "learn german".into(),
            description: String::new(),
            status: GoalStatus::Active,
            start_date: Some(start),
            target_date: Some(target),
            created_at: at(1, 1, 0),
            updated_at: at(1, 1, 0),
        }
    }

    #[tokio::test]
    async fn thirty_day_goal_half_done_on_day_ten() {
        // start 01-01, target 01-31 (30 days); 1 of 2 milestones done, day 10.
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let goal = goal_with_dates(user, d(1, 1), d(1, 31));
        store.save_goal(&goal).await.unwrap();

        let mut done = Milestone::new(goal.id, "finish A1");
        done.complete(at(1, 10, 12));
        store.save_milestone(&done).await.unwrap();
        store
            .save_milestone(&Milestone::new(goal.id, "finish A2"))
            .await
            .unwrap();

        let projector = GoalProjector::new(store);
        let today = d(1, 11); // ten days elapsed
        let progress = projector.update_goal_progress(&goal, today).await.unwrap();

        assert_eq!(progress.progress_percentage, 50.0);
        assert_eq!(progress.velocity, 5.0);
        // ceil(50 / 5) = 10 more days
        assert_eq!(progress.estimated_completion_date, Some(d(1, 21)));
        // expected ~33.3%, diff ~+16.7 => +5 days, comfortably on track
        assert_eq!(progress.days_ahead_or_behind, 5);
        assert!(progress.on_track);
        assert_eq!(progress.velocity_trend, VelocityTrend::Steady);
    }

    #[tokio::test]
    async fn behind_schedule_goal_is_off_track() {
        // 20 days elapsed of 30, nothing done: expected ~66.7, diff -66.7.
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let goal = goal_with_dates(user, d(1, 1), d(1, 31));
        store.save_goal(&goal).await.unwrap();
        store
            .save_milestone(&Milestone::new(goal.id, "only milestone"))
            .await
            .unwrap();

        let projector = GoalProjector::new(store);
        let progress = projector
            .update_goal_progress(&goal, d(1, 21))
            .await
            .unwrap();

        assert_eq!(progress.progress_percentage, 0.0);
        assert_eq!(progress.velocity, 0.0);
        assert!(progress.estimated_completion_date.is_none());
        assert!(!progress.on_track);
        assert!(progress.days_ahead_or_behind < 0);
        assert_eq!(progress.velocity_trend, VelocityTrend::Stalled);
    }

    #[tokio::test]
    async fn no_milestones_means_zero_progress() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let goal = goal_with_dates(user, d(1, 1), d(1, 31));
        store.save_goal(&goal).await.unwrap();

        let projector = GoalProjector::new(store);
        let progress = projector.update_goal_progress(&goal, d(1, 5)).await.unwrap();
        assert_eq!(progress.progress_percentage, 0.0);
        assert_eq!(progress.milestones_total, 0);
    }

    #[tokio::test]
    async fn linked_tasks_are_counted() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let goal = goal_with_dates(user, d(1, 1), d(1, 31));
        store.save_goal(&goal).await.unwrap();

        let mut task_done = Task::new(user, "buy textbook", at(1, 2, 9));
        task_done.mark_completed(at(1, 3, 9));
        store.save_task(&task_done).await.unwrap();
        let task_open = Task::new(user, "find tutor", at(1, 2, 9));
        store.save_task(&task_open).await.unwrap();

        let mut milestone = Milestone::new(goal.id, "get started");
        milestone.tasks = vec![task_done.id, task_open.id];
        store.save_milestone(&milestone).await.unwrap();

        let projector = GoalProjector::new(store);
        let progress = projector.update_goal_progress(&goal, d(1, 5)).await.unwrap();
        assert_eq!(progress.tasks_total, 2);
        assert_eq!(progress.tasks_completed, 1);
    }

    #[tokio::test]
    async fn goal_without_timeline_skips_projection() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let mut goal = goal_with_dates(user, d(1, 1), d(1, 31));
        goal.start_date = None;
        store.save_goal(&goal).await.unwrap();

        let mut done = Milestone::new(goal.id, "step one");
        done.complete(at(1, 2, 12));
        store.save_milestone(&done).await.unwrap();

        let projector = GoalProjector::new(store);
        let progress = projector.update_goal_progress(&goal, d(1, 5)).await.unwrap();
        assert_eq!(progress.progress_percentage, 100.0);
        assert_eq!(progress.velocity, 0.0);
        assert!(progress.estimated_completion_date.is_none());
        assert!(progress.on_track); // default when there is no timeline
    }

    #[tokio::test]
    async fn update_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        let goal = goal_with_dates(user, d(1, 1), d(1, 31));
        store.save_goal(&goal).await.unwrap();
        let mut done = Milestone::new(goal.id, "step one");
        done.complete(at(1, 10, 12));
        store.save_milestone(&done).await.unwrap();

        let projector = GoalProjector::new(store);
        let first = projector.update_goal_progress(&goal, d(1, 11)).await.unwrap();
        let second = projector.update_goal_progress(&goal, d(1, 11)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn refresh_all_covers_every_goal() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new();
        for _ in 0..3 {
            store
                .save_goal(&goal_with_dates(user, d(1, 1), d(1, 31)))
                .await
                .unwrap();
        }

        let projector = GoalProjector::new(store);
        assert_eq!(projector.refresh_all(user, d(1, 5)).await.unwrap(), 3);
    }
}
