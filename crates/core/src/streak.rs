//! Per-user streak state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Consecutive-active-day streak bookkeeping for one user.
///
/// An "active day" is a calendar day with at least one qualifying completion.
/// Invariant at rest: `longest_streak >= current_streak`. The tracker may
/// violate it mid-update but never after a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Owner
    pub user_id: UserId,

    /// Current consecutive active days
    pub current_streak: u32,

    /// When the current streak started
    pub current_streak_start: Option<NaiveDate>,

    /// Most recent active date
    pub last_activity_date: Option<NaiveDate>,

    /// Longest streak ever achieved
    pub longest_streak: u32,

    /// When the longest streak started
    pub longest_streak_start: Option<NaiveDate>,

    /// When the longest streak ended
    pub longest_streak_end: Option<NaiveDate>,
}

impl StreakState {
    /// Fresh state with no recorded activity.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current_streak: 0,
            current_streak_start: None,
            last_activity_date: None,
            longest_streak: 0,
            longest_streak_start: None,
            longest_streak_end: None,
        }
    }

    /// Whether the at-rest invariant holds.
    pub fn is_consistent(&self) -> bool {
        self.longest_streak >= self.current_streak
    }
}
