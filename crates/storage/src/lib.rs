//! Storage abstraction and implementations for Cadence.
//!
//! This crate provides the trait-based record store the analytics services
//! compute against, with an in-memory backend for tests and embedding hosts
//! and a JSON-file reference implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_store;

pub use trait_::{Store, StorageError, Result};
pub use memory::MemoryStore;
pub use json_store::JsonStore;
