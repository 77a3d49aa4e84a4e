//! The dedicated-server capability trait and a mock implementation.

use crate::error::ProtocolFault;
use crate::types::{MapListPage, MaxPlayersInfo, PlayerEntry, RawMapInfo, ScriptSettings};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A typed view of the dedicated server's remote-control surface.
///
/// Implementors own the transport (socket, authentication, call
/// encoding); every method either returns a value or raises a
/// [`ProtocolFault`]. The `connected` flag reflects transport liveness
/// and is consulted by [`crate::ConnectionGuard`] before any call.
pub trait DedicatedRemote: Send + Sync {
    /// Establishes the transport connection and authenticates.
    fn connect(&self) -> Result<(), ProtocolFault>;

    /// Tears down the transport connection.
    fn close(&self);

    /// Whether the transport connection is currently alive.
    fn connected(&self) -> bool;

    /// `GetServerName`.
    fn server_name(&self) -> Result<String, ProtocolFault>;

    /// `GetMaxPlayers`.
    fn max_players(&self) -> Result<MaxPlayersInfo, ProtocolFault>;

    /// `SetMaxPlayers`.
    fn set_max_players(&self, max_players: i32) -> Result<(), ProtocolFault>;

    /// `GetPlayerList`. The first entry is the server's own header entry.
    fn player_list(&self, limit: u32, offset: u32) -> Result<Vec<PlayerEntry>, ProtocolFault>;

    /// `GetCurrentMapIndex`.
    fn current_map_index(&self) -> Result<i32, ProtocolFault>;

    /// `JumpToMapIndex`.
    fn jump_to_map_index(&self, index: i32) -> Result<(), ProtocolFault>;

    /// `GetModeScriptSettings`.
    fn mode_script_settings(&self) -> Result<ScriptSettings, ProtocolFault>;

    /// `SetModeScriptSettings`. Returns whether the server accepted the
    /// new settings.
    fn set_mode_script_settings(&self, settings: &ScriptSettings) -> Result<bool, ProtocolFault>;

    /// `GetMapList`, paged.
    fn map_list(&self, count: u32, offset: u32) -> Result<MapListPage, ProtocolFault>;
}

/// A scriptable in-memory remote for tests.
///
/// Starts disconnected; [`DedicatedRemote::connect`] flips the flag.
/// Responses are settable, faults can be injected per wire method name,
/// and mutating calls are recorded for assertions.
#[derive(Debug, Default)]
pub struct MockRemote {
    connected: AtomicBool,
    latency: Mutex<Option<Duration>>,
    faults: Mutex<BTreeMap<String, ProtocolFault>>,

    server_name: Mutex<String>,
    max_players: Mutex<MaxPlayersInfo>,
    players: Mutex<Vec<PlayerEntry>>,
    current_index: Mutex<i32>,
    settings: Mutex<ScriptSettings>,
    settings_rejected: AtomicBool,
    maps: Mutex<Vec<RawMapInfo>>,
    malformed_tail: AtomicBool,

    map_list_calls: AtomicUsize,
    player_list_calls: AtomicUsize,
    jumps: Mutex<Vec<i32>>,
    written_settings: Mutex<Vec<ScriptSettings>>,
    written_max_players: Mutex<Vec<i32>>,
}

impl MockRemote {
    /// Creates a disconnected mock that accepts settings writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server name response.
    pub fn set_server_name(&self, name: impl Into<String>) {
        *self.server_name.lock() = name.into();
    }

    /// Sets the max-players response.
    pub fn set_max_players_info(&self, info: MaxPlayersInfo) {
        *self.max_players.lock() = info;
    }

    /// Sets the raw player-list response, header entry included.
    pub fn set_players(&self, players: Vec<PlayerEntry>) {
        *self.players.lock() = players;
    }

    /// Sets the current map index response.
    pub fn set_current_index(&self, index: i32) {
        *self.current_index.lock() = index;
    }

    /// Sets the mode-script settings response.
    pub fn set_settings(&self, settings: ScriptSettings) {
        *self.settings.lock() = settings;
    }

    /// Makes `SetModeScriptSettings` report acceptance or rejection.
    pub fn set_settings_accepted(&self, accepted: bool) {
        self.settings_rejected.store(!accepted, Ordering::SeqCst);
    }

    /// Sets the full map rotation served page by page.
    pub fn set_maps(&self, maps: Vec<RawMapInfo>) {
        *self.maps.lock() = maps;
    }

    /// Serves a malformed page once pagination runs past the rotation.
    pub fn set_malformed_tail(&self, malformed: bool) {
        self.malformed_tail.store(malformed, Ordering::SeqCst);
    }

    /// Injects a fault for the given wire method name, e.g. `"GetMapList"`.
    pub fn set_fault(&self, method: impl Into<String>, fault: ProtocolFault) {
        self.faults.lock().insert(method.into(), fault);
    }

    /// Clears a previously injected fault.
    pub fn clear_fault(&self, method: &str) {
        self.faults.lock().remove(method);
    }

    /// Adds an artificial delay to every call.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Number of `GetMapList` calls issued so far.
    pub fn map_list_calls(&self) -> usize {
        self.map_list_calls.load(Ordering::SeqCst)
    }

    /// Number of `GetPlayerList` calls issued so far.
    pub fn player_list_calls(&self) -> usize {
        self.player_list_calls.load(Ordering::SeqCst)
    }

    /// Indices passed to `JumpToMapIndex`, in call order.
    pub fn jumps(&self) -> Vec<i32> {
        self.jumps.lock().clone()
    }

    /// Settings mappings written via `SetModeScriptSettings`, in call order.
    pub fn written_settings(&self) -> Vec<ScriptSettings> {
        self.written_settings.lock().clone()
    }

    /// Limits written via `SetMaxPlayers`, in call order.
    pub fn written_max_players(&self) -> Vec<i32> {
        self.written_max_players.lock().clone()
    }

    fn simulate(&self, method: &str) -> Result<(), ProtocolFault> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
        match self.faults.lock().get(method) {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }
}

impl DedicatedRemote for MockRemote {
    fn connect(&self) -> Result<(), ProtocolFault> {
        self.simulate("Connect")?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn server_name(&self) -> Result<String, ProtocolFault> {
        self.simulate("GetServerName")?;
        Ok(self.server_name.lock().clone())
    }

    fn max_players(&self) -> Result<MaxPlayersInfo, ProtocolFault> {
        self.simulate("GetMaxPlayers")?;
        Ok(*self.max_players.lock())
    }

    fn set_max_players(&self, max_players: i32) -> Result<(), ProtocolFault> {
        self.simulate("SetMaxPlayers")?;
        self.written_max_players.lock().push(max_players);
        self.max_players.lock().current_value = max_players;
        Ok(())
    }

    fn player_list(&self, limit: u32, offset: u32) -> Result<Vec<PlayerEntry>, ProtocolFault> {
        self.simulate("GetPlayerList")?;
        self.player_list_calls.fetch_add(1, Ordering::SeqCst);
        let players = self.players.lock();
        let start = (offset as usize).min(players.len());
        let end = (start + limit as usize).min(players.len());
        Ok(players[start..end].to_vec())
    }

    fn current_map_index(&self) -> Result<i32, ProtocolFault> {
        self.simulate("GetCurrentMapIndex")?;
        Ok(*self.current_index.lock())
    }

    fn jump_to_map_index(&self, index: i32) -> Result<(), ProtocolFault> {
        self.simulate("JumpToMapIndex")?;
        self.jumps.lock().push(index);
        *self.current_index.lock() = index;
        Ok(())
    }

    fn mode_script_settings(&self) -> Result<ScriptSettings, ProtocolFault> {
        self.simulate("GetModeScriptSettings")?;
        Ok(self.settings.lock().clone())
    }

    fn set_mode_script_settings(&self, settings: &ScriptSettings) -> Result<bool, ProtocolFault> {
        self.simulate("SetModeScriptSettings")?;
        self.written_settings.lock().push(settings.clone());
        if self.settings_rejected.load(Ordering::SeqCst) {
            Ok(false)
        } else {
            *self.settings.lock() = settings.clone();
            Ok(true)
        }
    }

    fn map_list(&self, count: u32, offset: u32) -> Result<MapListPage, ProtocolFault> {
        self.simulate("GetMapList")?;
        self.map_list_calls.fetch_add(1, Ordering::SeqCst);
        let maps = self.maps.lock();
        let start = (offset as usize).min(maps.len());
        if start >= maps.len() && self.malformed_tail.load(Ordering::SeqCst) {
            return Ok(MapListPage::Malformed);
        }
        let end = (start + count as usize).min(maps.len());
        Ok(MapListPage::Maps(maps[start..end].to_vec()))
    }
}
