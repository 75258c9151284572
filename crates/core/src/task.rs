//! Task model - the unit of work the engine evaluates.

use serde::{Deserialize, Serialize};

use crate::id::{GoalId, TaskId, UserId};
use crate::recurrence::RecurrenceRule;
use crate::Time;

/// A task, either completed once or repeating on a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Owner
    pub user_id: UserId,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Priority
    pub priority: Priority,

    /// Recurrence settings; present iff the task is recurring
    pub recurrence: Option<RecurrenceRule>,

    /// Goal this task contributes to, if any
    pub goal_id: Option<GoalId>,

    /// Deadline for non-recurring tasks
    pub due_date: Option<Time>,

    /// When a non-recurring task was completed
    pub completed_at: Option<Time>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,
    /// Being worked on
    InProgress,
    /// Done (non-recurring tasks only; recurring tasks track completions
    /// in the ledger instead)
    Completed,
    /// Hidden from active views
    Archived,
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority
    Low,
    /// Medium priority
    Medium,
    /// High priority
    High,
    /// Urgent
    Urgent,
}

impl Task {
    /// Create a new task in the Todo state.
    pub fn new(user_id: UserId, title: impl Into<String>, now: Time) -> Self {
        Self {
            id: TaskId::new(),
            user_id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            recurrence: None,
            goal_id: None,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this task repeats on a schedule.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Mark a non-recurring task as completed.
    ///
    /// Recurring tasks never transition to Completed; their progress is a
    /// stream of completion events appended to the ledger.
    pub fn mark_completed(&mut self, now: Time) {
        if self.is_recurring() {
            return;
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Whether the task is past its due date and still open.
    pub fn is_overdue(&self, now: Time) -> bool {
        match self.due_date {
            Some(due) if self.status != TaskStatus::Completed => now > due,
            _ => false,
        }
    }
}
