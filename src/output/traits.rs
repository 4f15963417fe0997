//! Output traits and error types
//!
//! This module defines the persistence seam used at the end of a run and
//! the error type shared by every output format.

use crate::state::AggregateSnapshot;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Durable sink for the aggregate snapshot
///
/// `flush` is called exactly once per run: after normal completion, or after
/// dispatch stopped because of an interrupt. Implementations must be
/// thread-safe.
pub trait Persister: Send + Sync {
    /// Writes the snapshot, replacing any previous document
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The aggregate state to persist
    fn flush(&self, snapshot: &AggregateSnapshot) -> OutputResult<()>;

    /// Human-readable destination, for log lines
    fn describe(&self) -> String;
}
