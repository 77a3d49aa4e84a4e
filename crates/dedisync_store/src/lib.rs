//! # dedisync store
//!
//! Durable key→row store for resolved map metadata.
//!
//! One row per map UID, holding the identifiers and medal thresholds
//! resolved from the public catalog. Rows are write-once in practice (a
//! map's content and catalog identity never change), so the store only
//! needs two operations: replay everything at start, and append one row.
//!
//! ## Available stores
//!
//! - [`FileStore`] - append-only JSON-lines log, replayed on open
//! - [`InMemoryStore`] - for tests and ephemeral use
//!
//! ## Example
//!
//! ```rust
//! use dedisync_store::{InMemoryStore, MedalTimes, MetadataRow, MetadataStore};
//!
//! let mut store = InMemoryStore::new();
//! store.upsert(&MetadataRow {
//!     uid: "abc123".into(),
//!     catalog_id: 7001,
//!     online_id: "e3ff".into(),
//!     medals: MedalTimes::default(),
//! }).unwrap();
//! assert_eq!(store.load_all().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod row;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use row::{MedalTimes, MetadataRow};
pub use store::MetadataStore;
