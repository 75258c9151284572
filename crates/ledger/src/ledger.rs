//! Append-only completion recording.

use std::sync::Arc;

use cadence_core::{CompletionEvent, CompletionId, TaskId, Time};
use cadence_recurrence::PeriodWindow;
use cadence_storage::{Store, StorageError};

use super::Result;

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Completion references a task that does not exist
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// Per-call input rejected; the engine never retries these
    #[error("invalid completion: {0}")]
    Validation(String),

    /// Underlying storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Append-only record of completion events per task.
///
/// Recording never mutates past events; the only removals are sync
/// reconciliation and the cascade when the owning task is deleted.
pub struct CompletionLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for CompletionLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> CompletionLedger<S> {
    /// Create a ledger over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record one completion.
    ///
    /// Rejects a negative or non-finite `value` and a `task_id` with no
    /// owning task; both are validation errors surfaced to the caller.
    pub async fn record(
        &self,
        task_id: TaskId,
        occurred_at: Time,
        value: Option<f64>,
        note: Option<String>,
    ) -> Result<CompletionEvent> {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(LedgerError::Validation(format!(
                    "completion value must be non-negative, got {v}"
                )));
            }
        }
        if self.store.load_task(task_id).await?.is_none() {
            return Err(LedgerError::UnknownTask(task_id));
        }

        let mut event = CompletionEvent::new(task_id, occurred_at);
        event.value = value;
        if let Some(note) = note {
            event.note = note;
        }

        self.store.append_completion(&event).await?;
        tracing::debug!(task = %task_id, at = %occurred_at, "completion recorded");
        Ok(event)
    }

    /// Remove a completion (sync reconciliation or undo).
    pub async fn remove(&self, id: CompletionId) -> Result<()> {
        self.store.delete_completion(id).await?;
        tracing::debug!(completion = %id, "completion removed");
        Ok(())
    }

    /// All events for a task, ordered by `occurred_at`.
    pub async fn history(&self, task_id: TaskId) -> Result<Vec<CompletionEvent>> {
        Ok(self.store.completions_for_task(task_id).await?)
    }

    /// Events for a task inside a window, ordered by `occurred_at`.
    pub async fn completions_in(
        &self,
        task_id: TaskId,
        window: PeriodWindow,
    ) -> Result<Vec<CompletionEvent>> {
        Ok(self
            .store
            .completions_for_task_in(task_id, window.start, window.end)
            .await?)
    }
}
