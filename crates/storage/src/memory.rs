//! In-memory storage backend.
//!
//! Backs the test suites and single-process hosts that persist elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use cadence_core::{
    BucketKind, CompletionEvent, CompletionId, DailyAggregate, Goal, GoalId, GoalProgress,
    HabitPerformance, Milestone, MilestoneId, PeriodComparison, StreakState, Task, TaskId, Time,
    UserId,
};
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{Result, Store};

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    completions: HashMap<CompletionId, CompletionEvent>,
    goals: HashMap<GoalId, Goal>,
    milestones: HashMap<MilestoneId, Milestone>,
    streaks: HashMap<UserId, StreakState>,
    dailies: HashMap<(UserId, NaiveDate), DailyAggregate>,
    habit_performance: HashMap<TaskId, HabitPerformance>,
    goal_progress: HashMap<GoalId, GoalProgress>,
    comparisons: HashMap<(UserId, BucketKind, NaiveDate), PeriodComparison>,
}

/// Hash-map backed store guarded by a single RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_time(mut events: Vec<CompletionEvent>) -> Vec<CompletionEvent> {
    events.sort_by_key(|e| e.occurred_at);
    events
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_task(&self, task: &Task) -> Result<()> {
        self.inner.write().await.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn load_task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>> {
        Ok(self
            .inner
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.tasks.remove(&id);
        inner.completions.retain(|_, e| e.task_id != id);
        inner.habit_performance.remove(&id);
        Ok(())
    }

    async fn append_completion(&self, event: &CompletionEvent) -> Result<()> {
        self.inner
            .write()
            .await
            .completions
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn delete_completion(&self, id: CompletionId) -> Result<()> {
        self.inner.write().await.completions.remove(&id);
        Ok(())
    }

    async fn completions_for_task(&self, task_id: TaskId) -> Result<Vec<CompletionEvent>> {
        let events = self
            .inner
            .read()
            .await
            .completions
            .values()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect();
        Ok(sorted_by_time(events))
    }

    async fn completions_for_task_in(
        &self,
        task_id: TaskId,
        start: Time,
        end: Time,
    ) -> Result<Vec<CompletionEvent>> {
        let events = self
            .inner
            .read()
            .await
            .completions
            .values()
            .filter(|e| e.task_id == task_id && e.occurred_at >= start && e.occurred_at < end)
            .cloned()
            .collect();
        Ok(sorted_by_time(events))
    }

    async fn completions_for_user(&self, user_id: UserId) -> Result<Vec<CompletionEvent>> {
        let inner = self.inner.read().await;
        let events = inner
            .completions
            .values()
            .filter(|e| {
                inner
                    .tasks
                    .get(&e.task_id)
                    .map(|t| t.user_id == user_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(sorted_by_time(events))
    }

    async fn save_goal(&self, goal: &Goal) -> Result<()> {
        self.inner.write().await.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        Ok(self.inner.read().await.goals.get(&id).cloned())
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>> {
        Ok(self
            .inner
            .read()
            .await
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_milestone(&self, milestone: &Milestone) -> Result<()> {
        self.inner
            .write()
            .await
            .milestones
            .insert(milestone.id, milestone.clone());
        Ok(())
    }

    async fn list_milestones(&self, goal_id: GoalId) -> Result<Vec<Milestone>> {
        Ok(self
            .inner
            .read()
            .await
            .milestones
            .values()
            .filter(|m| m.goal_id == goal_id)
            .cloned()
            .collect())
    }

    async fn load_streak(&self, user_id: UserId) -> Result<Option<StreakState>> {
        Ok(self.inner.read().await.streaks.get(&user_id).cloned())
    }

    async fn save_streak(&self, streak: &StreakState) -> Result<()> {
        self.inner
            .write()
            .await
            .streaks
            .insert(streak.user_id, streak.clone());
        Ok(())
    }

    async fn list_active_streaks(&self) -> Result<Vec<StreakState>> {
        Ok(self
            .inner
            .read()
            .await
            .streaks
            .values()
            .filter(|s| s.current_streak > 0)
            .cloned()
            .collect())
    }

    async fn save_daily(&self, aggregate: &DailyAggregate) -> Result<()> {
        self.inner
            .write()
            .await
            .dailies
            .insert((aggregate.user_id, aggregate.date), aggregate.clone());
        Ok(())
    }

    async fn load_daily(&self, user_id: UserId, date: NaiveDate) -> Result<Option<DailyAggregate>> {
        Ok(self.inner.read().await.dailies.get(&(user_id, date)).cloned())
    }

    async fn daily_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        let mut records: Vec<DailyAggregate> = self
            .inner
            .read()
            .await
            .dailies
            .values()
            .filter(|d| d.user_id == user_id && d.date >= start && d.date <= end)
            .cloned()
            .collect();
        records.sort_by_key(|d| d.date);
        Ok(records)
    }

    async fn save_habit_performance(&self, perf: &HabitPerformance) -> Result<()> {
        self.inner
            .write()
            .await
            .habit_performance
            .insert(perf.task_id, perf.clone());
        Ok(())
    }

    async fn load_habit_performance(&self, task_id: TaskId) -> Result<Option<HabitPerformance>> {
        Ok(self
            .inner
            .read()
            .await
            .habit_performance
            .get(&task_id)
            .cloned())
    }

    async fn save_goal_progress(&self, progress: &GoalProgress) -> Result<()> {
        self.inner
            .write()
            .await
            .goal_progress
            .insert(progress.goal_id, progress.clone());
        Ok(())
    }

    async fn load_goal_progress(&self, goal_id: GoalId) -> Result<Option<GoalProgress>> {
        Ok(self.inner.read().await.goal_progress.get(&goal_id).cloned())
    }

    async fn save_comparison(&self, comparison: &PeriodComparison) -> Result<()> {
        self.inner.write().await.comparisons.insert(
            (comparison.user_id, comparison.kind, comparison.period_start),
            comparison.clone(),
        );
        Ok(())
    }

    async fn load_comparison(
        &self,
        user_id: UserId,
        kind: BucketKind,
        period_start: NaiveDate,
    ) -> Result<Option<PeriodComparison>> {
        Ok(self
            .inner
            .read()
            .await
            .comparisons
            .get(&(user_id, kind, period_start))
            .cloned())
    }

    async fn latest_comparison_before(
        &self,
        user_id: UserId,
        kind: BucketKind,
        before: NaiveDate,
    ) -> Result<Option<PeriodComparison>> {
        Ok(self
            .inner
            .read()
            .await
            .comparisons
            .values()
            .filter(|c| c.user_id == user_id && c.kind == kind && c.period_start < before)
            .max_by_key(|c| c.period_start)
            .cloned())
    }
}
