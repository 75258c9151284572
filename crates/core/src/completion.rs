//! Completion events - the append-only record of progress.

use serde::{Deserialize, Serialize};

use crate::id::{CompletionId, TaskId};
use crate::Time;

/// A single recorded completion of a recurring task.
///
/// Events are immutable once created. They may be deleted by sync
/// reconciliation or when the owning task is deleted, but never edited;
/// every derived statistic is recomputable from the surviving events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Unique identifier
    pub id: CompletionId,

    /// Owning task
    pub task_id: TaskId,

    /// When the progress occurred
    pub occurred_at: Time,

    /// Amount completed, in the task's unit (minutes, pages, ...);
    /// None for plain count-one completions
    pub value: Option<f64>,

    /// Optional note about this completion
    pub note: String,
}

impl CompletionEvent {
    /// Create a new completion event.
    pub fn new(task_id: TaskId, occurred_at: Time) -> Self {
        Self {
            id: CompletionId::new(),
            task_id,
            occurred_at,
            value: None,
            note: String::new(),
        }
    }

    /// Attach a completed amount.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Calendar date of the completion.
    pub fn date(&self) -> chrono::NaiveDate {
        self.occurred_at.date_naive()
    }
}
