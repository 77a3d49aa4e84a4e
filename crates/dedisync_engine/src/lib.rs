//! # dedisync engine
//!
//! Mirrors the live configuration of a TrackMania dedicated server into a
//! locally held snapshot, kept fresh by a background synchronizer, and
//! enriches that snapshot with metadata from two external services: the
//! public map catalog and the authenticated per-user records service.
//!
//! This crate provides:
//! - [`Synchronizer`] - owns the published [`ServerState`] snapshot and
//!   the background resync loop
//! - [`RefreshSignal`] - coalesced wake primitive for on-demand resyncs
//! - [`MetadataCache`] - permanent per-UID cache of catalog identifiers
//!   and medal thresholds, written through to a durable store
//! - [`RecordResolver`] - batch correlation of a user's record times
//!   against cached medal thresholds
//! - [`ExchangeClient`] - catalog lookup over any [`HttpClient`]
//!
//! ## Key invariants
//!
//! - The snapshot is best-effort: readers may observe a stale state, never
//!   a partially updated one
//! - One catalog lookup per UID, ever; resolutions are durable before they
//!   are visible
//! - The resync loop never dies; a failed pass is logged and the next one
//!   runs on schedule
//! - No operation is retried automatically

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod exchange;
mod http;
mod records;
mod state;
mod sync;

pub use cache::{CatalogClient, MetadataCache};
pub use config::SyncConfig;
pub use error::{EngineError, EngineResult};
pub use exchange::ExchangeClient;
pub use http::{HttpClient, HttpError, UreqClient};
pub use records::{medal_for, Medal, RecordResolver, UserRecord, UserToken, RECORDS_BATCH_WIDTH};
pub use state::{MapEntry, ModeScriptSettings, ServerState, TIME_LIMIT_KEY};
pub use sync::{fetch_all_maps, RefreshSignal, SyncPhase, SyncStats, Synchronizer};

pub use dedisync_store::{MedalTimes, MetadataRow};
