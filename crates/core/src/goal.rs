//! Goal and milestone models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{GoalId, MilestoneId, TaskId, UserId};
use crate::Time;

/// A long-running objective with a timeline and milestones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: GoalId,

    /// Owner
    pub user_id: UserId,

    /// Goal title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Goal status
    pub status: GoalStatus,

    /// When work on the goal starts
    pub start_date: Option<NaiveDate>,

    /// Deadline the goal should be completed by
    pub target_date: Option<NaiveDate>,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

/// Goal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Being planned, not yet started
    Planning,
    /// Actively worked on
    Active,
    /// Completed
    Completed,
    /// Abandoned
    Abandoned,
}

/// A checkpoint on the way to a goal.
///
/// Milestones carry the task links the projector counts; a completed
/// milestone contributes to the goal's progress percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique identifier
    pub id: MilestoneId,

    /// Owning goal
    pub goal_id: GoalId,

    /// Milestone title
    pub title: String,

    /// Milestone status
    pub status: MilestoneStatus,

    /// When it was completed
    pub completed_at: Option<Time>,

    /// Tasks linked to this milestone
    pub tasks: Vec<TaskId>,
}

/// Milestone status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    /// Not yet reached
    Pending,
    /// Reached
    Completed,
}

impl Milestone {
    /// Create a pending milestone for a goal.
    pub fn new(goal_id: GoalId, title: impl Into<String>) -> Self {
        Self {
            id: MilestoneId::new(),
            goal_id,
            title: title.into(),
            status: MilestoneStatus::Pending,
            completed_at: None,
            tasks: Vec::new(),
        }
    }

    /// Mark the milestone completed at the given instant.
    pub fn complete(&mut self, now: Time) {
        self.status = MilestoneStatus::Completed;
        self.completed_at = Some(now);
    }
}
