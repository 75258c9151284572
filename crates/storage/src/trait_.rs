//! Storage trait abstraction.

use async_trait::async_trait;
use cadence_core::{
    BucketKind, CompletionEvent, CompletionId, DailyAggregate, Goal, GoalId, GoalProgress,
    HabitPerformance, Milestone, PeriodComparison, StreakState, Task, TaskId, Time, UserId,
};
use chrono::NaiveDate;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for Cadence data.
///
/// This trait allows different storage backends to be plugged in. All methods
/// take `&self`; backends are expected to provide their own interior locking
/// so services can share a store behind `Arc`.
#[async_trait]
pub trait Store: Send + Sync {
    // === Task operations ===

    /// Save a task (create or update).
    async fn save_task(&self, task: &Task) -> Result<()>;

    /// Load a task by ID.
    async fn load_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// List all tasks owned by a user.
    async fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>>;

    /// Delete a task, cascading to its completion events.
    async fn delete_task(&self, id: TaskId) -> Result<()>;

    // === Completion ledger ===

    /// Append a completion event. Events are never updated in place.
    async fn append_completion(&self, event: &CompletionEvent) -> Result<()>;

    /// Delete a completion event (sync reconciliation / undo).
    async fn delete_completion(&self, id: CompletionId) -> Result<()>;

    /// All completion events for a task, ordered by `occurred_at`.
    async fn completions_for_task(&self, task_id: TaskId) -> Result<Vec<CompletionEvent>>;

    /// Completion events for a task within `[start, end)`, ordered by
    /// `occurred_at`.
    async fn completions_for_task_in(
        &self,
        task_id: TaskId,
        start: Time,
        end: Time,
    ) -> Result<Vec<CompletionEvent>>;

    /// All completion events across a user's tasks, ordered by `occurred_at`.
    async fn completions_for_user(&self, user_id: UserId) -> Result<Vec<CompletionEvent>>;

    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&self, goal: &Goal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>>;

    /// List all goals owned by a user.
    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>>;

    /// Save a milestone (create or update).
    async fn save_milestone(&self, milestone: &Milestone) -> Result<()>;

    /// List a goal's milestones.
    async fn list_milestones(&self, goal_id: GoalId) -> Result<Vec<Milestone>>;

    // === Streak state ===

    /// Load a user's streak state.
    async fn load_streak(&self, user_id: UserId) -> Result<Option<StreakState>>;

    /// Save a user's streak state.
    async fn save_streak(&self, streak: &StreakState) -> Result<()>;

    /// All streak states with a nonzero current streak (daily sweep input).
    async fn list_active_streaks(&self) -> Result<Vec<StreakState>>;

    // === Daily aggregates ===

    /// Upsert the aggregate for (user, date).
    async fn save_daily(&self, aggregate: &DailyAggregate) -> Result<()>;

    /// Load the aggregate for (user, date).
    async fn load_daily(&self, user_id: UserId, date: NaiveDate) -> Result<Option<DailyAggregate>>;

    /// Aggregates for a user over `[start, end]` (inclusive), ordered by date.
    async fn daily_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>>;

    // === Habit performance ===

    /// Upsert a habit performance record.
    async fn save_habit_performance(&self, perf: &HabitPerformance) -> Result<()>;

    /// Load the performance record for a task.
    async fn load_habit_performance(&self, task_id: TaskId) -> Result<Option<HabitPerformance>>;

    // === Goal progress ===

    /// Upsert a goal progress record.
    async fn save_goal_progress(&self, progress: &GoalProgress) -> Result<()>;

    /// Load the progress record for a goal.
    async fn load_goal_progress(&self, goal_id: GoalId) -> Result<Option<GoalProgress>>;

    // === Period comparisons ===

    /// Upsert a comparison bucket.
    async fn save_comparison(&self, comparison: &PeriodComparison) -> Result<()>;

    /// Load the bucket for (user, kind, period_start).
    async fn load_comparison(
        &self,
        user_id: UserId,
        kind: BucketKind,
        period_start: NaiveDate,
    ) -> Result<Option<PeriodComparison>>;

    /// Most recent bucket of the same kind starting strictly before `before`.
    async fn latest_comparison_before(
        &self,
        user_id: UserId,
        kind: BucketKind,
        before: NaiveDate,
    ) -> Result<Option<PeriodComparison>>;
}
