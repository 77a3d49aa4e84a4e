//! Configuration for the synchronizer.

use std::time::Duration;

/// Configuration for the synchronizer and its external lookups.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long the background loop waits between resync passes when no
    /// refresh is requested.
    pub resync_interval: Duration,
    /// Page size used when paging through the map rotation.
    pub map_page_size: u32,
    /// Player-list request limit.
    pub player_list_limit: u32,
    /// Timeout applied to every external HTTP call.
    pub http_timeout: Duration,
    /// Base URL of the public map catalog.
    pub exchange_base_url: String,
    /// Base URL of the per-user records service.
    pub records_base_url: String,
}

impl SyncConfig {
    /// Creates a configuration with production defaults.
    pub fn new() -> Self {
        Self {
            resync_interval: Duration::from_secs(60),
            map_page_size: 5,
            player_list_limit: 100,
            http_timeout: Duration::from_secs(15),
            exchange_base_url: "https://trackmania.exchange".into(),
            records_base_url: "https://prod.trackmania.core.nadeo.online".into(),
        }
    }

    /// Sets the resync interval.
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Sets the map page size.
    pub fn with_map_page_size(mut self, size: u32) -> Self {
        self.map_page_size = size;
        self
    }

    /// Sets the player-list request limit.
    pub fn with_player_list_limit(mut self, limit: u32) -> Self {
        self.player_list_limit = limit;
        self
    }

    /// Sets the external HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Sets the catalog base URL.
    pub fn with_exchange_base_url(mut self, url: impl Into<String>) -> Self {
        self.exchange_base_url = url.into();
        self
    }

    /// Sets the records-service base URL.
    pub fn with_records_base_url(mut self, url: impl Into<String>) -> Self {
        self.records_base_url = url.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
