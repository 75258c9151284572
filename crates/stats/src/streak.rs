//! Per-user streak tracking.
//!
//! The incremental path reacts to each completion event; the daily sweep
//! catches users who simply stopped; the full recompute rebuilds the state
//! from ledger truth and is the repair path for any drift between the two.

use std::sync::Arc;

use cadence_core::{StreakState, TaskStatus, UserId};
use cadence_storage::Store;
use chrono::{Duration, NaiveDate};

use crate::runs::{active_run, longest_run, scan_runs};
use crate::Result;

/// How one activity date relates to the streak state.
///
/// The three transitions of the `(current_streak, last_activity_date)`
/// state machine, kept separate from persistence so the decision table is
/// testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Activity on a date already counted
    AlreadyCounted,
    /// Activity on the day after the last active date
    Extended,
    /// First activity ever, or a gap of two or more days
    Started,
}

impl StreakTransition {
    /// Classify an activity date against the last recorded active date.
    pub fn classify(last_activity: Option<NaiveDate>, date: NaiveDate) -> Self {
        match last_activity {
            Some(last) if last == date => StreakTransition::AlreadyCounted,
            Some(last) if date - last == Duration::days(1) => StreakTransition::Extended,
            _ => StreakTransition::Started,
        }
    }
}

/// Maintains each user's consecutive-active-day streak.
pub struct StreakTracker<S> {
    store: Arc<S>,
}

impl<S: Store> StreakTracker<S> {
    /// Create a tracker over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn load_or_new(&self, user_id: UserId) -> Result<StreakState> {
        Ok(self
            .store
            .load_streak(user_id)
            .await?
            .unwrap_or_else(|| StreakState::new(user_id)))
    }

    /// Apply one activity date to the user's streak.
    ///
    /// Callers must serialize updates per user and apply events in
    /// `occurred_at` order; out-of-order application can diverge from the
    /// recompute result until [`recalculate`](Self::recalculate) heals it.
    pub async fn update_streak(&self, user_id: UserId, date: NaiveDate) -> Result<StreakState> {
        let mut streak = self.load_or_new(user_id).await?;

        match StreakTransition::classify(streak.last_activity_date, date) {
            StreakTransition::AlreadyCounted => return Ok(streak),
            StreakTransition::Extended => {
                streak.current_streak += 1;
            }
            StreakTransition::Started => {
                close_out(&mut streak);
                streak.current_streak = 1;
                streak.current_streak_start = Some(date);
            }
        }
        streak.last_activity_date = Some(date);

        // The record must already reflect a run that just passed it; waiting
        // for the run to break would leave longest < current at rest.
        if streak.current_streak > streak.longest_streak {
            streak.longest_streak = streak.current_streak;
            streak.longest_streak_start = streak.current_streak_start;
            streak.longest_streak_end = Some(date);
        }

        self.store.save_streak(&streak).await?;
        Ok(streak)
    }

    /// Daily sweep: zero the streak of a user with no activity yesterday or
    /// today, folding the finished run into the record fields.
    pub async fn check_streak_broken(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<StreakState> {
        let mut streak = self.load_or_new(user_id).await?;

        let stale = streak
            .last_activity_date
            .map(|last| last < today - Duration::days(1))
            .unwrap_or(false);
        if stale && streak.current_streak > 0 {
            close_out(&mut streak);
            streak.current_streak = 0;
            streak.current_streak_start = None;
            self.store.save_streak(&streak).await?;
            tracing::info!(user = %user_id, "streak broken by inactivity");
        }
        Ok(streak)
    }

    /// Run the break check across every user with a live streak.
    ///
    /// One user's failure does not block the rest of the sweep.
    pub async fn sweep_broken(&self, today: NaiveDate) -> Result<usize> {
        let mut checked = 0;
        for state in self.store.list_active_streaks().await? {
            match self.check_streak_broken(state.user_id, today).await {
                Ok(_) => checked += 1,
                Err(e) => {
                    tracing::warn!(user = %state.user_id, error = %e, "streak sweep failed for user");
                }
            }
        }
        Ok(checked)
    }

    /// Rebuild the streak state from scratch out of ledger truth.
    ///
    /// Active dates are the distinct completion dates across the user's
    /// recurring tasks plus the completion dates of one-off completed tasks.
    /// Idempotent, and agrees with incremental updates replayed in order.
    pub async fn recalculate(&self, user_id: UserId, today: NaiveDate) -> Result<StreakState> {
        let mut dates: Vec<NaiveDate> = self
            .store
            .completions_for_user(user_id)
            .await?
            .iter()
            .map(|e| e.date())
            .collect();

        for task in self.store.list_tasks(user_id).await? {
            if !task.is_recurring() && task.status == TaskStatus::Completed {
                if let Some(done) = task.completed_at {
                    dates.push(done.date_naive());
                }
            }
        }

        dates.sort();
        dates.dedup();

        let mut streak = StreakState::new(user_id);
        let runs = scan_runs(&dates);

        if let Some(best) = longest_run(&runs) {
            streak.longest_streak = best.len;
            streak.longest_streak_start = Some(best.start);
            streak.longest_streak_end = Some(best.end);
        }
        if let Some(active) = active_run(&runs, today) {
            streak.current_streak = active.len;
            streak.current_streak_start = Some(active.start);
        }
        streak.last_activity_date = dates.last().copied();

        self.store.save_streak(&streak).await?;
        Ok(streak)
    }
}

/// Fold the current run into the record fields if it beats them.
fn close_out(streak: &mut StreakState) {
    if streak.current_streak > streak.longest_streak {
        streak.longest_streak = streak.current_streak;
        streak.longest_streak_start = streak.current_streak_start;
        streak.longest_streak_end = streak.last_activity_date;
    }
}
