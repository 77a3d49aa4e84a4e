//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A row failed to encode or decode.
    #[error("row codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The store file is corrupted at the given line.
    #[error("store corrupted at line {line}: {detail}")]
    Corrupted {
        /// 1-based line number of the first unreadable row.
        line: usize,
        /// Parser detail.
        detail: String,
    },
}
