//! Connection-checked wrapper around a [`DedicatedRemote`].

use crate::error::{ProtocolFault, RemoteError, RemoteResult};
use crate::remote::DedicatedRemote;
use crate::types::{MapListPage, ScriptSettings};

/// Wraps a remote capability and enforces the connection precondition.
///
/// Every state-reading or state-mutating operation against the remote
/// must observe `connected == true` before the call is issued; when the
/// check fails the operation returns [`RemoteError::NotConnected`] and no
/// partial call reaches the transport. The check lives in exactly one
/// place ([`ConnectionGuard::call`]) rather than being repeated per
/// method.
///
/// The guard also owns the small response-shape fixups the wire surface
/// needs: the header entry of the player list is dropped and the
/// max-players structure is reduced to its current value.
#[derive(Debug)]
pub struct ConnectionGuard<R> {
    remote: R,
}

impl<R: DedicatedRemote> ConnectionGuard<R> {
    /// Wraps a remote capability.
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    /// The wrapped capability.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Establishes the connection. The only operation allowed while
    /// disconnected.
    pub fn connect(&self) -> RemoteResult<()> {
        self.remote.connect().map_err(RemoteError::from)
    }

    /// Tears down the connection.
    pub fn close(&self) {
        self.remote.close();
    }

    /// Whether the underlying transport is alive.
    pub fn connected(&self) -> bool {
        self.remote.connected()
    }

    fn call<T>(&self, op: impl FnOnce(&R) -> Result<T, ProtocolFault>) -> RemoteResult<T> {
        if !self.remote.connected() {
            return Err(RemoteError::NotConnected);
        }
        op(&self.remote).map_err(RemoteError::from)
    }

    /// Returns the server display name.
    pub fn server_name(&self) -> RemoteResult<String> {
        self.call(|r| r.server_name())
    }

    /// Returns the player limit currently in force.
    pub fn max_players(&self) -> RemoteResult<i32> {
        self.call(|r| r.max_players()).map(|info| info.current_value)
    }

    /// Sets the player limit.
    pub fn set_max_players(&self, max_players: i32) -> RemoteResult<()> {
        self.call(|r| r.set_max_players(max_players))
    }

    /// Returns player display names in server-reported order, with the
    /// server's own header entry dropped.
    pub fn player_list(&self, limit: u32, offset: u32) -> RemoteResult<Vec<String>> {
        let raw = self.call(|r| r.player_list(limit, offset))?;
        Ok(raw.into_iter().skip(1).map(|p| p.nick_name).collect())
    }

    /// Returns the index of the map currently being played.
    pub fn current_map_index(&self) -> RemoteResult<i32> {
        self.call(|r| r.current_map_index())
    }

    /// Instructs the server to jump to the given rotation index.
    pub fn jump_to_map_index(&self, index: i32) -> RemoteResult<()> {
        self.call(|r| r.jump_to_map_index(index))
    }

    /// Returns the current mode-script settings mapping.
    pub fn mode_script_settings(&self) -> RemoteResult<ScriptSettings> {
        self.call(|r| r.mode_script_settings())
    }

    /// Writes a full mode-script settings mapping. Returns whether the
    /// server accepted it.
    pub fn set_mode_script_settings(&self, settings: &ScriptSettings) -> RemoteResult<bool> {
        self.call(|r| r.set_mode_script_settings(settings))
    }

    /// Requests one page of the map rotation.
    pub fn map_page(&self, count: u32, offset: u32) -> RemoteResult<MapListPage> {
        self.call(|r| r.map_list(count, offset))
    }
}
