//! Productivity analytics services.
//!
//! Streaks, daily aggregates, habit performance, goal velocity projection,
//! and period-over-period comparison. Every `update_*` entry point fully
//! rebuilds its derived record from the completion ledger and the owning
//! entities, so a repeated or retried call lands on the same bytes.

#![warn(missing_docs)]

mod runs;

pub mod streak;
pub mod daily;
pub mod habits;
pub mod goals;
pub mod compare;

pub use streak::{StreakTracker, StreakTransition};
pub use daily::{DailyAggregator, ProductivitySummary};
pub use habits::{HabitAnalyzer, HabitsSummary};
pub use goals::GoalProjector;
pub use compare::{ComparisonResult, PeriodComparator};

use cadence_storage::StorageError;

/// Result alias for analytics operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors from analytics recomputation.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Underlying storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Referenced entity is missing
    #[error("missing entity: {0}")]
    MissingEntity(String),
}
