//! In-memory store for testing.

use crate::error::StoreResult;
use crate::row::MetadataRow;
use crate::store::MetadataStore;

/// An in-memory metadata store.
///
/// Keeps the same append-log shape as [`crate::FileStore`] so replay
/// semantics (write order, last-write-wins per UID) can be exercised
/// without touching the filesystem.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Vec<MetadataRow>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with rows.
    #[must_use]
    pub fn with_rows(rows: Vec<MetadataRow>) -> Self {
        Self { rows }
    }

    /// Number of appended rows (duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MetadataStore for InMemoryStore {
    fn load_all(&self) -> StoreResult<Vec<MetadataRow>> {
        Ok(self.rows.clone())
    }

    fn upsert(&mut self, row: &MetadataRow) -> StoreResult<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}
