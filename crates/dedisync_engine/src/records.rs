//! Per-user record lookup and medal classification.

use crate::error::{EngineError, EngineResult};
use crate::http::HttpClient;
use crate::state::MapEntry;
use dedisync_store::MedalTimes;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Maximum number of map ids the records service accepts per call.
pub const RECORDS_BATCH_WIDTH: usize = 20;

/// A named achievement band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    /// No threshold beaten.
    None,
    /// Bronze threshold beaten.
    Bronze,
    /// Silver threshold beaten.
    Silver,
    /// Gold threshold beaten.
    Gold,
    /// Author threshold beaten.
    Author,
}

/// One record of a user on one map. Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRecord {
    /// The user's best time in milliseconds.
    pub raw_time_ms: i64,
    /// The medal tier that time earns.
    pub medal: Medal,
}

/// Opaque bearer token from the out-of-scope authorization-code flow.
#[derive(Clone)]
pub struct UserToken(String);

impl UserToken {
    /// Wraps a raw access token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token, for the Authorization header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log token material.
        f.write_str("UserToken(..)")
    }
}

/// Classifies a raw time against a map's medal thresholds.
///
/// The checks run in a fixed order and later matches override earlier
/// ones. Thresholds are maxima, compared strictly: a time equal to a
/// threshold does not earn that medal. The thresholds are not guaranteed
/// to be ordered by the catalog; when they are not, whichever check runs
/// last wins, which is the intended reading of the data.
#[must_use]
pub fn medal_for(times: &MedalTimes, raw_time_ms: i64) -> Medal {
    let mut medal = Medal::None;
    if raw_time_ms < times.bronze {
        medal = Medal::Bronze;
    }
    if raw_time_ms < times.silver {
        medal = Medal::Silver;
    }
    if raw_time_ms < times.gold {
        medal = Medal::Gold;
    }
    if raw_time_ms < times.author {
        medal = Medal::Author;
    }
    medal
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "mapId")]
    map_id: String,
    time: i64,
}

/// Batched lookup of one user's records across a set of maps.
///
/// Results are keyed by online map id and carry the medal tier computed
/// from the cached thresholds. Nothing here is persisted.
pub struct RecordResolver<H> {
    http: H,
    base_url: String,
}

impl<H: HttpClient> RecordResolver<H> {
    /// Creates a resolver against the given records-service base URL.
    pub fn new(http: H, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetches the user's records for `maps` and classifies each against
    /// that map's thresholds.
    ///
    /// Maps the user has no record on are absent from the result. One
    /// request is issued per batch of [`RECORDS_BATCH_WIDTH`] maps.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RecordsUnavailable`] when any batch request
    /// fails; the whole call fails, nothing partial is returned.
    pub fn resolve_records(
        &self,
        token: &UserToken,
        maps: &[MapEntry],
    ) -> EngineResult<HashMap<String, UserRecord>> {
        let thresholds: HashMap<&str, &MedalTimes> = maps
            .iter()
            .map(|map| (map.online_id.as_str(), &map.medals))
            .collect();

        let unavailable = |reason: String| EngineError::RecordsUnavailable { reason };

        let mut records = HashMap::new();
        for batch in maps.chunks(RECORDS_BATCH_WIDTH) {
            let ids: Vec<&str> = batch.iter().map(|map| map.online_id.as_str()).collect();
            let url = format!("{}/mapRecords/?mapIdList={}", self.base_url, ids.join(","));

            let body = self
                .http
                .get(&url, Some(token.as_str()))
                .map_err(|e| unavailable(e.to_string()))?;
            let rows: Vec<RawRecord> =
                serde_json::from_slice(&body).map_err(|e| unavailable(e.to_string()))?;

            for row in rows {
                let Some(times) = thresholds.get(row.map_id.as_str()) else {
                    continue;
                };
                records.insert(
                    row.map_id,
                    UserRecord {
                        raw_time_ms: row.time,
                        medal: medal_for(times, row.time),
                    },
                );
            }
        }

        Ok(records)
    }
}
