//! Derived statistics records.
//!
//! Everything in this module is cache state: each record must always be
//! reproducible from the completion ledger and the owning entities. The
//! services that maintain them fully overwrite the record on every update,
//! so none of these types carry incremental bookkeeping of their own.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{GoalId, TaskId, UserId};

/// Daily aggregated activity for one user, one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    /// Owner
    pub user_id: UserId,

    /// Calendar date the numbers cover
    pub date: NaiveDate,

    /// Tasks completed that day (recurring completions + one-off tasks)
    pub tasks_completed: u32,

    /// Tasks created that day
    pub tasks_created: u32,

    /// Recurring-task completion events that day
    pub habit_completions: u32,

    /// Total recorded value that day (minutes for time-based tasks)
    pub time_spent: f64,

    /// Completions per hour of day (0-23)
    pub completions_by_hour: BTreeMap<u8, u32>,

    /// Milestones completed that day
    pub milestones_completed: u32,
}

impl DailyAggregate {
    /// Empty aggregate for a (user, date) pair.
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            tasks_completed: 0,
            tasks_created: 0,
            habit_completions: 0,
            time_spent: 0.0,
            completions_by_hour: BTreeMap::new(),
            milestones_completed: 0,
        }
    }
}

/// Trend classification for a habit, recent half-window vs the older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Clearly more activity recently
    Improving,
    /// Roughly unchanged
    Stable,
    /// Noticeably less activity recently
    Declining,
    /// Activity collapsed
    AtRisk,
}

impl Default for Trend {
    fn default() -> Self {
        Trend::Stable
    }
}

/// Performance metrics for one recurring task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitPerformance {
    /// The recurring task these numbers describe
    pub task_id: TaskId,

    /// Percentage of expected days/periods met in the last 30 days (0-100)
    pub consistency_rate: f64,

    /// Consecutive-day run ending today or yesterday
    pub current_streak: u32,

    /// Longest consecutive-day run in the task's history
    pub longest_streak: u32,

    /// Recent-versus-older activity classification
    pub trend: Trend,

    /// Most recent completion date
    pub last_completion_date: Option<NaiveDate>,

    /// Completions in the last 7 days
    pub completions_last_7_days: u32,

    /// Completions in the last 30 days
    pub completions_last_30_days: u32,

    /// All-time completion count
    pub total_completions: u32,

    /// Completion counts per date, last 365 days
    pub completion_heatmap: BTreeMap<NaiveDate, u32>,
}

impl HabitPerformance {
    /// Empty record for a task.
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            consistency_rate: 0.0,
            current_streak: 0,
            longest_streak: 0,
            trend: Trend::default(),
            last_completion_date: None,
            completions_last_7_days: 0,
            completions_last_30_days: 0,
            total_completions: 0,
            completion_heatmap: BTreeMap::new(),
        }
    }
}

/// Velocity classification for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    /// Progress is speeding up
    Accelerating,
    /// Progress is steady
    Steady,
    /// Progress is slowing down
    Slowing,
    /// No recent progress at all
    Stalled,
}

impl Default for VelocityTrend {
    fn default() -> Self {
        VelocityTrend::Steady
    }
}

/// Progress statistics and projections for one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// The goal these numbers describe
    pub goal_id: GoalId,

    /// Overall completion percentage (0-100), from milestones
    pub progress_percentage: f64,

    /// Progress percentage gained per day since the goal started
    pub velocity: f64,

    /// Coarse velocity classification
    pub velocity_trend: VelocityTrend,

    /// Total milestones
    pub milestones_total: u32,

    /// Completed milestones
    pub milestones_completed: u32,

    /// Tasks linked to the goal via milestones
    pub tasks_total: u32,

    /// Completed linked tasks
    pub tasks_completed: u32,

    /// Projected completion date at the current velocity
    pub estimated_completion_date: Option<NaiveDate>,

    /// Positive = ahead of schedule, negative = behind
    pub days_ahead_or_behind: i32,

    /// Whether progress is within tolerance of the timeline
    pub on_track: bool,

    /// Most recent milestone completion date
    pub last_activity_date: Option<NaiveDate>,

    /// Days since the last milestone completion
    pub days_since_activity: u32,
}

impl GoalProgress {
    /// Empty record for a goal.
    pub fn new(goal_id: GoalId) -> Self {
        Self {
            goal_id,
            progress_percentage: 0.0,
            velocity: 0.0,
            velocity_trend: VelocityTrend::default(),
            milestones_total: 0,
            milestones_completed: 0,
            tasks_total: 0,
            tasks_completed: 0,
            estimated_completion_date: None,
            days_ahead_or_behind: 0,
            on_track: true,
            last_activity_date: None,
            days_since_activity: 0,
        }
    }
}

/// Bucket granularity for period-over-period comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// Monday-aligned calendar week
    Week,
    /// Calendar month
    Month,
}

impl BucketKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::Week => "week",
            BucketKind::Month => "month",
        }
    }
}

impl std::fmt::Display for BucketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated totals for one comparison bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    /// Owner
    pub user_id: UserId,

    /// Bucket granularity
    pub kind: BucketKind,

    /// First date of the bucket
    pub period_start: NaiveDate,

    /// Last date of the bucket (inclusive)
    pub period_end: NaiveDate,

    /// Tasks completed in the bucket
    pub tasks_completed: u32,

    /// Tasks created in the bucket
    pub tasks_created: u32,

    /// Recurring completions in the bucket
    pub habit_completions: u32,

    /// Total recorded value in the bucket
    pub time_spent: f64,

    /// Milestones completed in the bucket
    pub milestones_completed: u32,

    /// Percent change in completed tasks vs the previous bucket
    pub tasks_change_percent: f64,

    /// Bounded productivity score (0-100)
    pub productivity_score: u32,
}

impl PeriodComparison {
    /// Empty bucket.
    pub fn new(user_id: UserId, kind: BucketKind, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            user_id,
            kind,
            period_start: start,
            period_end: end,
            tasks_completed: 0,
            tasks_created: 0,
            habit_completions: 0,
            time_spent: 0.0,
            milestones_completed: 0,
            tasks_change_percent: 0.0,
            productivity_score: 0,
        }
    }
}
