//! Store trait definition.

use crate::error::StoreResult;
use crate::row::MetadataRow;

/// A durable key→row store for resolved map metadata.
///
/// # Invariants
///
/// - `upsert` is durable when it returns: the row survives process
///   termination before anything else observes it
/// - `load_all` replays rows in write order; callers apply last-write-wins
///   per UID
/// - Writes are independent single-row operations; no cross-row atomicity
///   is provided or needed
///
/// # Implementors
///
/// - [`crate::FileStore`] - persistent JSON-lines log
/// - [`crate::InMemoryStore`] - for testing
pub trait MetadataStore: Send + Sync {
    /// Replays every stored row, in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be read or a row
    /// other than a torn final one fails to decode.
    fn load_all(&self) -> StoreResult<Vec<MetadataRow>>;

    /// Appends one row, keyed by `row.uid`, durably.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be encoded or written.
    fn upsert(&mut self, row: &MetadataRow) -> StoreResult<()>;
}
