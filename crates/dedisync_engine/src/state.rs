//! The published server snapshot model.

use dedisync_remote::{RawMapInfo, ScriptSettings, ScriptValue};
use dedisync_store::{MedalTimes, MetadataRow};

/// Wire key of the round time limit in the mode-script settings mapping.
pub const TIME_LIMIT_KEY: &str = "S_TimeLimit";

/// Mode-script settings mirrored into the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeScriptSettings {
    /// Round time limit in seconds.
    pub time_limit: i64,
}

impl ModeScriptSettings {
    /// Extracts the mirrored settings from a raw settings mapping.
    /// Missing or mistyped keys fall back to 0.
    #[must_use]
    pub fn from_script(settings: &ScriptSettings) -> Self {
        let time_limit = match settings.get(TIME_LIMIT_KEY) {
            Some(ScriptValue::Int(value)) => *value,
            _ => 0,
        };
        Self { time_limit }
    }

    /// Renders the mirrored settings back into a raw settings mapping.
    #[must_use]
    pub fn to_script(&self) -> ScriptSettings {
        let mut settings = ScriptSettings::new();
        settings.insert(TIME_LIMIT_KEY.into(), ScriptValue::Int(self.time_limit));
        settings
    }
}

/// One map in the server rotation, with resolved catalog metadata.
///
/// Immutable once constructed. The last three fields come exclusively
/// from the metadata cache and are fixed for the lifetime of the UID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// Position of the map in the server's rotation.
    pub rotation_index: usize,
    /// Stable textual unique identifier.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Map file path relative to the server's map directory.
    pub file_name: String,
    /// Environment the map was built in.
    pub environment: String,
    /// Author account login.
    pub author: String,
    /// Author display name.
    pub author_nickname: String,
    /// Gold time in milliseconds as the server reports it.
    pub gold_time_ms: i64,
    /// Copper price.
    pub price: i64,
    /// Map type identifier.
    pub map_type: String,
    /// Map style tag.
    pub map_style: String,
    /// Numeric catalog identifier, from the metadata cache.
    pub catalog_id: i64,
    /// Online service identifier, from the metadata cache.
    pub online_id: String,
    /// Medal thresholds in milliseconds, from the metadata cache.
    pub medals: MedalTimes,
}

impl MapEntry {
    /// Combines a raw rotation record with its resolved metadata row.
    #[must_use]
    pub fn from_raw(rotation_index: usize, raw: RawMapInfo, row: &MetadataRow) -> Self {
        Self {
            rotation_index,
            uid: raw.uid,
            name: raw.name,
            file_name: raw.file_name,
            environment: raw.environment,
            author: raw.author,
            author_nickname: raw.author_nickname,
            gold_time_ms: raw.gold_time,
            price: raw.copper_price,
            map_type: raw.map_type,
            map_style: raw.map_style,
            catalog_id: row.catalog_id,
            online_id: row.online_id.clone(),
            medals: row.medals,
        }
    }
}

/// A complete snapshot of the dedicated server's mirrored configuration.
///
/// Built whole by the synchronizer and published behind an `Arc`; readers
/// always observe an internally consistent snapshot, possibly a stale
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerState {
    /// Server display name.
    pub server_name: String,
    /// The map rotation, in server order.
    pub maps: Vec<MapEntry>,
    /// Player display names, in server-reported order.
    pub players: Vec<String>,
    /// Index of the map currently being played, -1 between maps.
    pub current_map_index: i32,
    /// Mirrored mode-script settings.
    pub mode_settings: ModeScriptSettings,
    /// Player limit in force.
    pub max_players: i32,
}

impl ServerState {
    /// The map currently being played, if the server is on one.
    ///
    /// `None` when the index is out of range; the server may legitimately
    /// be between maps.
    #[must_use]
    pub fn current_map(&self) -> Option<&MapEntry> {
        usize::try_from(self.current_map_index)
            .ok()
            .and_then(|index| self.maps.get(index))
    }
}
