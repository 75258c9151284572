//! Cadence core data models.
//!
//! This crate defines the entities the analytics engine computes over:
//! recurring tasks, their completion events, goals with milestones, and the
//! derived statistics records that cache what the engine computes.

#![warn(missing_docs)]

// Core identities
mod id;

// Recurring tasks and their completion history
mod recurrence;
mod task;
mod completion;

// Goals and milestones
mod goal;

// Derived statistics state
mod streak;
mod record;

// Validation
mod error;

// Re-exports
pub use id::*;

// Recurrence & Task
pub use recurrence::{PeriodKind, RecurrenceRule};
pub use task::{Task, TaskStatus, Priority};
pub use completion::CompletionEvent;

// Goal & Milestone
pub use goal::{Goal, GoalStatus, Milestone, MilestoneStatus};

// Derived records
pub use streak::StreakState;
pub use record::{
    DailyAggregate, HabitPerformance, Trend, GoalProgress, VelocityTrend,
    PeriodComparison, BucketKind,
};

pub use error::ModelError;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
