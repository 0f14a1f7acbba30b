//! Access Manager Core Library
//!
//! This library provides the core functionality for the access manager:
//! the CSV-backed record store (clients and network access entries), the
//! hash-chained audit event log, and the reachability probe.

pub mod csv;
pub mod events;
pub mod model;
pub mod platform;
pub mod probe;
pub mod stats;
pub mod store;

pub use events::{verify, ChainState, EventLogger, VerifyOutcome};
pub use model::{AccessEntry, AccessKind, Client, EventRecord};
pub use platform::{data_dir, ensure_data_dir};
pub use store::CsvStore;

// Re-export common types
use thiserror::Error;

/// Result type for access manager operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// General error type for access manager operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import error: {0}")]
    Import(String),
}
