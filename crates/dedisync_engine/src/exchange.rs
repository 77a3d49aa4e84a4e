//! Public map-catalog lookup client.

use crate::cache::CatalogClient;
use crate::error::{EngineError, EngineResult};
use crate::http::HttpClient;
use dedisync_store::{MedalTimes, MetadataRow};
use serde::Deserialize;
use tracing::debug;

/// The exact field selection requested from the catalog.
const CATALOG_FIELDS: &str = "MapId,OnlineMapId,Medals.Author,Medals.Gold,Medals.Silver,Medals.Bronze";

/// Catalog lookup over an [`HttpClient`].
///
/// One request per lookup, filtered by UID and restricted to the fields
/// the cache stores. The catalog is public; no authentication is sent.
pub struct ExchangeClient<H> {
    http: H,
    base_url: String,
}

impl<H: HttpClient> ExchangeClient<H> {
    /// Creates a client against the given catalog base URL.
    pub fn new(http: H, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// The catalog base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Results", default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "MapId")]
    map_id: i64,
    #[serde(rename = "OnlineMapId", default)]
    online_map_id: String,
    #[serde(rename = "Medals", default)]
    medals: RawMedals,
}

#[derive(Debug, Default, Deserialize)]
struct RawMedals {
    #[serde(rename = "Author", default)]
    author: i64,
    #[serde(rename = "Gold", default)]
    gold: i64,
    #[serde(rename = "Silver", default)]
    silver: i64,
    #[serde(rename = "Bronze", default)]
    bronze: i64,
}

impl<H: HttpClient> CatalogClient for ExchangeClient<H> {
    fn lookup(&self, uid: &str) -> EngineResult<MetadataRow> {
        let url = format!(
            "{}/api/maps?uid={}&fields={}",
            self.base_url, uid, CATALOG_FIELDS
        );

        let unavailable = |detail: String| {
            debug!(uid, %detail, "catalog lookup failed");
            EngineError::MetadataUnavailable { uid: uid.into() }
        };

        let body = self.http.get(&url, None).map_err(|e| unavailable(e.to_string()))?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|e| unavailable(e.to_string()))?;
        let result = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| unavailable("empty result set".into()))?;

        Ok(MetadataRow {
            uid: uid.into(),
            catalog_id: result.map_id,
            online_id: result.online_map_id,
            medals: MedalTimes {
                author: result.medals.author,
                gold: result.medals.gold,
                silver: result.medals.silver,
                bronze: result.medals.bronze,
            },
        })
    }
}
