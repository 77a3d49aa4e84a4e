//! The metadata row model.

use serde::{Deserialize, Serialize};

/// Medal thresholds for one map, in milliseconds.
///
/// Thresholds come from the catalog as-is and are not required to be
/// ordered; absent fields default to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MedalTimes {
    /// Author medal threshold.
    #[serde(rename = "author_medal", default)]
    pub author: i64,
    /// Gold medal threshold.
    #[serde(rename = "gold_medal", default)]
    pub gold: i64,
    /// Silver medal threshold.
    #[serde(rename = "silver_medal", default)]
    pub silver: i64,
    /// Bronze medal threshold.
    #[serde(rename = "bronze_medal", default)]
    pub bronze: i64,
}

/// One resolved metadata row, keyed by map UID.
///
/// A row is immutable for the lifetime of its UID: the underlying map
/// content and catalog identity never change, so rows are never updated
/// or evicted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    /// Map unique identifier (the key).
    pub uid: String,
    /// Numeric catalog identifier.
    pub catalog_id: i64,
    /// Online service identifier for the same map.
    pub online_id: String,
    /// Resolved medal thresholds.
    #[serde(flatten)]
    pub medals: MedalTimes,
}
