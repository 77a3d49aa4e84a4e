//! Permanent per-UID cache of resolved catalog metadata.

use crate::error::EngineResult;
use dedisync_store::{MetadataRow, MetadataStore};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tracing::debug;

/// Resolves a map UID against the public catalog.
///
/// [`crate::ExchangeClient`] is the production implementation; tests
/// substitute counting stubs.
pub trait CatalogClient: Send + Sync {
    /// Looks up the catalog row for one UID.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MetadataUnavailable`] when the catalog has
    /// no answer for the UID.
    fn lookup(&self, uid: &str) -> EngineResult<MetadataRow>;
}

impl<C: CatalogClient + ?Sized> CatalogClient for std::sync::Arc<C> {
    fn lookup(&self, uid: &str) -> EngineResult<MetadataRow> {
        self.as_ref().lookup(uid)
    }
}

/// Append-only mapping from map UID to resolved catalog metadata.
///
/// Keyed data is content-addressed and immutable, so entries are never
/// updated or evicted and staleness cannot arise. A miss triggers exactly
/// one catalog lookup; the resolved row is written through to the durable
/// store *before* it becomes visible in memory, so a crash immediately
/// after first use cannot lose the resolution.
///
/// # Concurrency
///
/// `resolve` may be called from any thread. Hits take a shared read lock
/// only. Misses serialize through a single writer lock and re-check after
/// acquiring it, so concurrent misses for the same UID collapse into one
/// network call and one durable write.
pub struct MetadataCache<S, C> {
    entries: RwLock<HashMap<String, MetadataRow>>,
    store: Mutex<S>,
    catalog: C,
    resolve_lock: Mutex<()>,
}

impl<S: MetadataStore, C: CatalogClient> MetadataCache<S, C> {
    /// Creates an empty cache over a durable store and a catalog client.
    ///
    /// Call [`MetadataCache::hydrate`] before first use.
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store: Mutex::new(store),
            catalog,
            resolve_lock: Mutex::new(()),
        }
    }

    /// Loads every durable row into the in-memory mapping.
    ///
    /// Rows are applied in write order, so a duplicated UID resolves to
    /// its most recent row.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store cannot be replayed.
    pub fn hydrate(&self) -> EngineResult<()> {
        let rows = self.store.lock().load_all()?;
        let count = rows.len();
        let mut entries = self.entries.write();
        for row in rows {
            entries.insert(row.uid.clone(), row);
        }
        debug!(rows = count, entries = entries.len(), "hydrated metadata cache");
        Ok(())
    }

    /// Resolves the catalog row for a UID.
    ///
    /// A hit returns immediately with no network access. A miss issues one
    /// catalog lookup, persists the row, publishes it in memory and
    /// returns it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MetadataUnavailable`] when the catalog
    /// lookup fails, or a store error when the row cannot be persisted.
    pub fn resolve(&self, uid: &str) -> EngineResult<MetadataRow> {
        if let Some(row) = self.entries.read().get(uid) {
            return Ok(row.clone());
        }

        let _writer = self.resolve_lock.lock();
        // A concurrent miss may have resolved this UID while we waited.
        if let Some(row) = self.entries.read().get(uid) {
            return Ok(row.clone());
        }

        let row = self.catalog.lookup(uid)?;
        self.store.lock().upsert(&row)?;
        self.entries.write().insert(uid.to_string(), row.clone());
        debug!(uid, catalog_id = row.catalog_id, "resolved map metadata");
        Ok(row)
    }

    /// Number of resolved UIDs currently in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no UID has been resolved or hydrated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
