//! JSON file storage implementation.
//!
//! Stores one pretty-printed JSON file per object under per-kind
//! subdirectories of a root path. Intended as the reference backend; hosts
//! with real databases implement [`Store`] themselves.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cadence_core::{
    BucketKind, CompletionEvent, CompletionId, DailyAggregate, Goal, GoalId, GoalProgress,
    HabitPerformance, Milestone, PeriodComparison, StreakState, Task, TaskId, Time, UserId,
};
use chrono::NaiveDate;
use tokio::fs;

use super::{Result, Store};

const KINDS: &[&str] = &[
    "tasks",
    "completions",
    "goals",
    "milestones",
    "streaks",
    "daily",
    "habits",
    "goal_progress",
    "comparisons",
];

/// File-based JSON storage backend.
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Create storage rooted at `root`, creating the per-kind
    /// subdirectories as needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in KINDS {
            fs::create_dir_all(root.join(kind)).await?;
        }
        tracing::debug!(root = %root.display(), "json store ready");
        Ok(Self { root })
    }

    fn task_path(&self, id: TaskId) -> PathBuf {
        self.root.join("tasks").join(format!("{}.json", id))
    }
    fn completion_path(&self, id: CompletionId) -> PathBuf {
        self.root.join("completions").join(format!("{}.json", id))
    }
    fn goal_path(&self, id: GoalId) -> PathBuf {
        self.root.join("goals").join(format!("{}.json", id))
    }
    fn milestone_path(&self, m: &Milestone) -> PathBuf {
        self.root.join("milestones").join(format!("{}.json", m.id))
    }
    fn streak_path(&self, user_id: UserId) -> PathBuf {
        self.root.join("streaks").join(format!("{}.json", user_id))
    }
    fn daily_path(&self, user_id: UserId, date: NaiveDate) -> PathBuf {
        self.root
            .join("daily")
            .join(format!("{}_{}.json", user_id, date))
    }
    fn habit_path(&self, task_id: TaskId) -> PathBuf {
        self.root.join("habits").join(format!("{}.json", task_id))
    }
    fn goal_progress_path(&self, goal_id: GoalId) -> PathBuf {
        self.root
            .join("goal_progress")
            .join(format!("{}.json", goal_id))
    }
    fn comparison_path(&self, c: &PeriodComparison) -> PathBuf {
        self.root
            .join("comparisons")
            .join(format!("{}_{}_{}.json", c.user_id, c.kind, c.period_start))
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json.as_bytes()).await?;
        Ok(())
    }

    async fn all_completions(&self) -> Result<Vec<CompletionEvent>> {
        list_dir(&self.root.join("completions")).await
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn save_task(&self, task: &Task) -> Result<()> {
        self.write_json(&self.task_path(task.id), task).await
    }

    async fn load_task(&self, id: TaskId) -> Result<Option<Task>> {
        read_json(&self.task_path(id)).await
    }

    async fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>> {
        let all: Vec<Task> = list_dir(&self.root.join("tasks")).await?;
        Ok(all.into_iter().filter(|t| t.user_id == user_id).collect())
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        remove_if_present(&self.task_path(id)).await?;
        remove_if_present(&self.habit_path(id)).await?;

        // Cascade to the task's ledger entries
        for event in self.all_completions().await? {
            if event.task_id == id {
                remove_if_present(&self.completion_path(event.id)).await?;
            }
        }
        Ok(())
    }

    async fn append_completion(&self, event: &CompletionEvent) -> Result<()> {
        self.write_json(&self.completion_path(event.id), event).await
    }

    async fn delete_completion(&self, id: CompletionId) -> Result<()> {
        remove_if_present(&self.completion_path(id)).await
    }

    async fn completions_for_task(&self, task_id: TaskId) -> Result<Vec<CompletionEvent>> {
        let mut events: Vec<CompletionEvent> = self
            .all_completions()
            .await?
            .into_iter()
            .filter(|e| e.task_id == task_id)
            .collect();
        events.sort_by_key(|e| e.occurred_at);
        Ok(events)
    }

    async fn completions_for_task_in(
        &self,
        task_id: TaskId,
        start: Time,
        end: Time,
    ) -> Result<Vec<CompletionEvent>> {
        let events = self.completions_for_task(task_id).await?;
        Ok(events
            .into_iter()
            .filter(|e| e.occurred_at >= start && e.occurred_at < end)
            .collect())
    }

    async fn completions_for_user(&self, user_id: UserId) -> Result<Vec<CompletionEvent>> {
        let owned: HashSet<TaskId> = self
            .list_tasks(user_id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let mut events: Vec<CompletionEvent> = self
            .all_completions()
            .await?
            .into_iter()
            .filter(|e| owned.contains(&e.task_id))
            .collect();
        events.sort_by_key(|e| e.occurred_at);
        Ok(events)
    }

    async fn save_goal(&self, goal: &Goal) -> Result<()> {
        self.write_json(&self.goal_path(goal.id), goal).await
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        read_json(&self.goal_path(id)).await
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>> {
        let all: Vec<Goal> = list_dir(&self.root.join("goals")).await?;
        Ok(all.into_iter().filter(|g| g.user_id == user_id).collect())
    }

    async fn save_milestone(&self, milestone: &Milestone) -> Result<()> {
        self.write_json(&self.milestone_path(milestone), milestone)
            .await
    }

    async fn list_milestones(&self, goal_id: GoalId) -> Result<Vec<Milestone>> {
        let all: Vec<Milestone> = list_dir(&self.root.join("milestones")).await?;
        Ok(all.into_iter().filter(|m| m.goal_id == goal_id).collect())
    }

    async fn load_streak(&self, user_id: UserId) -> Result<Option<StreakState>> {
        read_json(&self.streak_path(user_id)).await
    }

    async fn save_streak(&self, streak: &StreakState) -> Result<()> {
        self.write_json(&self.streak_path(streak.user_id), streak)
            .await
    }

    async fn list_active_streaks(&self) -> Result<Vec<StreakState>> {
        let all: Vec<StreakState> = list_dir(&self.root.join("streaks")).await?;
        Ok(all.into_iter().filter(|s| s.current_streak > 0).collect())
    }

    async fn save_daily(&self, aggregate: &DailyAggregate) -> Result<()> {
        self.write_json(
            &self.daily_path(aggregate.user_id, aggregate.date),
            aggregate,
        )
        .await
    }

    async fn load_daily(&self, user_id: UserId, date: NaiveDate) -> Result<Option<DailyAggregate>> {
        read_json(&self.daily_path(user_id, date)).await
    }

    async fn daily_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        let all: Vec<DailyAggregate> = list_dir(&self.root.join("daily")).await?;
        let mut records: Vec<DailyAggregate> = all
            .into_iter()
            .filter(|d| d.user_id == user_id && d.date >= start && d.date <= end)
            .collect();
        records.sort_by_key(|d| d.date);
        Ok(records)
    }

    async fn save_habit_performance(&self, perf: &HabitPerformance) -> Result<()> {
        self.write_json(&self.habit_path(perf.task_id), perf).await
    }

    async fn load_habit_performance(&self, task_id: TaskId) -> Result<Option<HabitPerformance>> {
        read_json(&self.habit_path(task_id)).await
    }

    async fn save_goal_progress(&self, progress: &GoalProgress) -> Result<()> {
        self.write_json(&self.goal_progress_path(progress.goal_id), progress)
            .await
    }

    async fn load_goal_progress(&self, goal_id: GoalId) -> Result<Option<GoalProgress>> {
        read_json(&self.goal_progress_path(goal_id)).await
    }

    async fn save_comparison(&self, comparison: &PeriodComparison) -> Result<()> {
        self.write_json(&self.comparison_path(comparison), comparison)
            .await
    }

    async fn load_comparison(
        &self,
        user_id: UserId,
        kind: BucketKind,
        period_start: NaiveDate,
    ) -> Result<Option<PeriodComparison>> {
        let path = self
            .root
            .join("comparisons")
            .join(format!("{}_{}_{}.json", user_id, kind, period_start));
        read_json(&path).await
    }

    async fn latest_comparison_before(
        &self,
        user_id: UserId,
        kind: BucketKind,
        before: NaiveDate,
    ) -> Result<Option<PeriodComparison>> {
        let all: Vec<PeriodComparison> = list_dir(&self.root.join("comparisons")).await?;
        Ok(all
            .into_iter()
            .filter(|c| c.user_id == user_id && c.kind == kind && c.period_start < before)
            .max_by_key(|c| c.period_start))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}

async fn remove_if_present(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Ok(())
        } else {
            Err(e.into())
        }
    })
}
