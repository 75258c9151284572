//! Completion ledger and period completion evaluation.
//!
//! The ledger is the append-only record of progress on recurring tasks;
//! the evaluator answers whether a task has met its target inside the
//! current calendar period, by completion count or by accumulated value.

#![warn(missing_docs)]

mod ledger;
mod evaluator;

pub use ledger::{CompletionLedger, LedgerError};
pub use evaluator::{PeriodEvaluator, PeriodProgress};

/// Result alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
