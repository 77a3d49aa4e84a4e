//! Typed records for the remote call surface.
//!
//! Field renames mirror the wire structure, including the French spelling
//! of `Environnement` that the dedicated server actually sends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw map record as reported by `GetMapList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMapInfo {
    /// Stable textual unique identifier, independent of any catalog id.
    #[serde(rename = "UId")]
    pub uid: String,
    /// Display name, possibly carrying in-game markup.
    #[serde(rename = "Name")]
    pub name: String,
    /// Path of the map file relative to the server's map directory.
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Environment the map was built in.
    #[serde(rename = "Environnement")]
    pub environment: String,
    /// Author account login.
    #[serde(rename = "Author")]
    pub author: String,
    /// Author display name.
    #[serde(rename = "AuthorNickname", default)]
    pub author_nickname: String,
    /// Gold medal time in milliseconds, as the server reports it.
    #[serde(rename = "GoldTime")]
    pub gold_time: i64,
    /// Copper price of the map.
    #[serde(rename = "CopperPrice")]
    pub copper_price: i64,
    /// Map type identifier.
    #[serde(rename = "MapType")]
    pub map_type: String,
    /// Map style tag, often empty.
    #[serde(rename = "MapStyle", default)]
    pub map_style: String,
}

/// One entry of a `GetPlayerList` response.
///
/// The first entry of every response is the server's own header entry and
/// is dropped by [`crate::ConnectionGuard::player_list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// Player display name.
    #[serde(rename = "NickName")]
    pub nick_name: String,
}

impl PlayerEntry {
    /// Creates an entry from a display name.
    pub fn new(nick_name: impl Into<String>) -> Self {
        Self {
            nick_name: nick_name.into(),
        }
    }
}

/// The structure returned by `GetMaxPlayers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaxPlayersInfo {
    /// The limit currently in force.
    #[serde(rename = "CurrentValue")]
    pub current_value: i32,
    /// The limit that takes effect on the next map.
    #[serde(rename = "NextValue", default)]
    pub next_value: i32,
}

/// A single mode-script setting value.
///
/// The script settings mapping is dynamically typed on the wire; values
/// are booleans, integers or text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    /// Boolean setting.
    Bool(bool),
    /// Integer setting.
    Int(i64),
    /// Text setting.
    Text(String),
}

/// The full mode-script settings mapping, keyed by setting name.
pub type ScriptSettings = BTreeMap<String, ScriptValue>;

/// One page of a `GetMapList` response.
///
/// The dedicated server occasionally answers a paged map-list call with
/// something that is not a sequence; callers treat such a page as the end
/// of the list rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapListPage {
    /// A well-formed page of raw map records.
    Maps(Vec<RawMapInfo>),
    /// A response that was not a sequence of map records.
    Malformed,
}
