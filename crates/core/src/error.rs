//! Model-level validation errors.

/// Errors raised when constructing or validating core entities.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Recurrence configuration rejected at creation
    #[error("invalid recurrence rule: {0}")]
    InvalidRule(String),

    /// Per-call input rejected (not retried)
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
