//! The snapshot synchronizer and its wake primitive.

use crate::cache::{CatalogClient, MetadataCache};
use crate::config::SyncConfig;
use crate::error::{EngineError, EngineResult};
use crate::state::{MapEntry, ModeScriptSettings, ServerState};
use dedisync_remote::{ConnectionGuard, DedicatedRemote, MapListPage, ScriptSettings};
use dedisync_store::MetadataStore;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Coalesced wake primitive for the resync loop.
///
/// A single boolean flag with wait/clear semantics, not a queue: any
/// number of raises before the waiter wakes collapse into one wake. The
/// flag is cleared under the same lock the waiter wakes with, so a raise
/// can never be lost between wake and clear.
#[derive(Debug, Default)]
pub struct RefreshSignal {
    flag: Mutex<bool>,
    wake: Condvar,
}

impl RefreshSignal {
    /// Creates an unraised signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. Idempotent and non-blocking.
    pub fn raise(&self) {
        let mut flag = self.flag.lock();
        *flag = true;
        self.wake.notify_one();
    }

    /// Waits until the signal is raised or `timeout` elapses, then clears
    /// it. Returns whether a raise was observed.
    pub fn wait_and_clear(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut flag = self.flag.lock();
        while !*flag {
            if self.wake.wait_until(&mut flag, deadline).timed_out() {
                break;
            }
        }
        std::mem::take(&mut *flag)
    }
}

/// The synchronizer's lifecycle phase.
///
/// There is exactly one transition: a successful [`Synchronizer::connect`]
/// moves Disconnected → Synchronizing, and Synchronizing lasts until
/// process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No connection has been established yet.
    Disconnected,
    /// The background loop is mirroring the server.
    Synchronizing,
}

/// Counters describing the background loop's progress.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed resync passes (the initial connect pull not included).
    pub passes_completed: u64,
    /// Message of the most recent failed pass, cleared by a success.
    pub last_error: Option<String>,
    /// Completion instant of the most recent successful pass.
    pub last_sync: Option<Instant>,
}

/// Pages through the full map rotation and attaches catalog metadata.
///
/// Pages of `page_size` are requested from offset 0 until a short page
/// ends the list; a malformed page also ends the list rather than failing
/// (defensive termination). Each raw record is resolved through the cache
/// exactly once.
///
/// # Errors
///
/// Propagates guard errors for page requests and cache errors for
/// metadata resolution.
pub fn fetch_all_maps<R, S, C>(
    guard: &ConnectionGuard<R>,
    cache: &MetadataCache<S, C>,
    page_size: u32,
) -> EngineResult<Vec<MapEntry>>
where
    R: DedicatedRemote,
    S: MetadataStore,
    C: CatalogClient,
{
    let mut raw = Vec::new();
    let mut offset = 0u32;
    loop {
        match guard.map_page(page_size, offset)? {
            MapListPage::Maps(page) => {
                let received = page.len();
                raw.extend(page);
                if received == 0 || (received as u32) < page_size {
                    break;
                }
                offset += page_size;
            }
            MapListPage::Malformed => break,
        }
    }

    raw.into_iter()
        .enumerate()
        .map(|(index, record)| {
            let row = cache.resolve(&record.uid)?;
            Ok(MapEntry::from_raw(index, record, &row))
        })
        .collect()
}

struct Inner<R, S, C> {
    guard: ConnectionGuard<R>,
    cache: MetadataCache<S, C>,
    config: SyncConfig,
    phase: RwLock<SyncPhase>,
    connect_started: AtomicBool,
    published: RwLock<Option<Arc<ServerState>>>,
    signal: RefreshSignal,
    stats: RwLock<SyncStats>,
}

/// Mirrors a dedicated server's configuration into a published snapshot.
///
/// Cheap to clone; all clones share one state. A successful
/// [`Synchronizer::connect`] performs the initial full pull synchronously
/// and then starts one background thread that re-pulls on a timer or on
/// [`Synchronizer::request_refresh`].
///
/// # Snapshot semantics
///
/// Each pass builds a complete new [`ServerState`] off to the side and
/// publishes it with a single reference swap. Readers get an `Arc` clone:
/// always internally consistent, possibly stale, never partial.
pub struct Synchronizer<R, S, C> {
    inner: Arc<Inner<R, S, C>>,
}

impl<R, S, C> Clone for Synchronizer<R, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S, C> Synchronizer<R, S, C>
where
    R: DedicatedRemote + 'static,
    S: MetadataStore + 'static,
    C: CatalogClient + 'static,
{
    /// Creates a disconnected synchronizer.
    pub fn new(remote: R, store: S, catalog: C, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                guard: ConnectionGuard::new(remote),
                cache: MetadataCache::new(store, catalog),
                config,
                phase: RwLock::new(SyncPhase::Disconnected),
                connect_started: AtomicBool::new(false),
                published: RwLock::new(None),
                signal: RefreshSignal::new(),
                stats: RwLock::new(SyncStats::default()),
            }),
        }
    }

    /// The guarded remote surface.
    pub fn guard(&self) -> &ConnectionGuard<R> {
        &self.inner.guard
    }

    /// The metadata cache.
    pub fn cache(&self) -> &MetadataCache<S, C> {
        &self.inner.cache
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> SyncPhase {
        *self.inner.phase.read()
    }

    /// A copy of the loop counters.
    pub fn stats(&self) -> SyncStats {
        self.inner.stats.read().clone()
    }

    /// The most recently published snapshot, if any.
    pub fn state(&self) -> Option<Arc<ServerState>> {
        self.inner.published.read().clone()
    }

    /// Connects to the server, performs the initial full pull, publishes
    /// the first snapshot and starts the background loop.
    ///
    /// # Errors
    ///
    /// If the connection or any step of the initial pull fails, the error
    /// propagates, no snapshot is published, no thread is started and the
    /// phase stays Disconnected.
    pub fn connect(&self) -> EngineResult<()> {
        if self.inner.connect_started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyConnected);
        }

        let connected = (|| -> EngineResult<()> {
            self.inner.guard.connect()?;
            self.inner.cache.hydrate()?;
            let state = self.pull_full_state()?;
            self.publish(state);
            Ok(())
        })();

        if let Err(err) = connected {
            self.inner.connect_started.store(false, Ordering::SeqCst);
            return Err(err);
        }

        let inner = Arc::clone(&self.inner);
        let spawned = std::thread::Builder::new()
            .name("dedisync-resync".into())
            .spawn(move || Inner::run_loop(&inner));
        if let Err(err) = spawned {
            self.inner.connect_started.store(false, Ordering::SeqCst);
            return Err(EngineError::ThreadSpawn(err));
        }

        *self.inner.phase.write() = SyncPhase::Synchronizing;
        info!("connected, starting resync loop");
        Ok(())
    }

    /// Asks the background loop to resync now. Idempotent, non-blocking,
    /// performs no remote call itself.
    pub fn request_refresh(&self) {
        self.inner.signal.raise();
    }

    /// Closes the remote transport.
    ///
    /// The background loop keeps running and its passes fail with
    /// `NotConnected` from then on; the published snapshot stays readable
    /// and simply goes stale.
    pub fn disconnect(&self) {
        info!("closing remote transport");
        self.inner.guard.close();
    }

    /// Instructs the server to jump to the given rotation index.
    ///
    /// The snapshot is not touched; request a refresh to observe the
    /// jump.
    ///
    /// # Errors
    ///
    /// `NotConnected` when disconnected, `RemoteOperationFailed` when the
    /// server rejects the jump.
    pub fn set_current_map(&self, index: i32) -> EngineResult<()> {
        self.inner.guard.jump_to_map_index(index)?;
        Ok(())
    }

    /// Merges `patch` over the server's current mode-script settings and
    /// writes the result back. Patch keys win.
    ///
    /// # Errors
    ///
    /// `SettingsRejected` when the server does not accept the merged
    /// mapping, `RemoteOperationFailed` on a fault.
    pub fn set_mode_settings(&self, patch: &ScriptSettings) -> EngineResult<()> {
        let mut merged = self.inner.guard.mode_script_settings()?;
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        let accepted = self.inner.guard.set_mode_script_settings(&merged)?;
        if !accepted {
            return Err(EngineError::SettingsRejected);
        }
        Ok(())
    }

    /// Sets the server's player limit.
    ///
    /// # Errors
    ///
    /// `NotConnected` when disconnected, `RemoteOperationFailed` when the
    /// server rejects the limit.
    pub fn set_max_players(&self, max_players: i32) -> EngineResult<()> {
        self.inner.guard.set_max_players(max_players)?;
        Ok(())
    }

    fn pull_full_state(&self) -> EngineResult<ServerState> {
        let inner = &self.inner;
        let maps = fetch_all_maps(&inner.guard, &inner.cache, inner.config.map_page_size)?;
        let current_map_index = inner.guard.current_map_index()?;
        let mode_settings = ModeScriptSettings::from_script(&inner.guard.mode_script_settings()?);
        let server_name = inner.guard.server_name()?;
        let max_players = inner.guard.max_players()?;
        let players = inner.guard.player_list(inner.config.player_list_limit, 0)?;

        Ok(ServerState {
            server_name,
            maps,
            players,
            current_map_index,
            mode_settings,
            max_players,
        })
    }

    fn publish(&self, state: ServerState) {
        *self.inner.published.write() = Some(Arc::new(state));
    }
}

impl<R, S, C> Inner<R, S, C>
where
    R: DedicatedRemote,
    S: MetadataStore,
    C: CatalogClient,
{
    fn run_loop(&self) {
        loop {
            match self.resync_pass() {
                Ok(()) => {
                    let mut stats = self.stats.write();
                    stats.passes_completed += 1;
                    stats.last_sync = Some(Instant::now());
                    stats.last_error = None;
                }
                Err(err) => {
                    // Staleness, not crash: the pass is dropped and the
                    // next one runs on schedule.
                    warn!(error = %err, "resync pass failed");
                    self.stats.write().last_error = Some(err.to_string());
                }
            }
            self.signal.wait_and_clear(self.config.resync_interval);
        }
    }

    /// One full re-pull of map list, current index, mode settings and
    /// player list. Server name and player limit are carried over from
    /// the previous snapshot.
    fn resync_pass(&self) -> EngineResult<()> {
        let maps = fetch_all_maps(&self.guard, &self.cache, self.config.map_page_size)?;
        let current_map_index = self.guard.current_map_index()?;
        let mode_settings = ModeScriptSettings::from_script(&self.guard.mode_script_settings()?);
        let players = self.guard.player_list(self.config.player_list_limit, 0)?;

        let (server_name, max_players) = match self.published.read().as_ref() {
            Some(previous) => (previous.server_name.clone(), previous.max_players),
            None => (self.guard.server_name()?, self.guard.max_players()?),
        };

        let state = ServerState {
            server_name,
            maps,
            players,
            current_map_index,
            mode_settings,
            max_players,
        };
        *self.published.write() = Some(Arc::new(state));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use dedisync_remote::{MaxPlayersInfo, MockRemote, PlayerEntry, ProtocolFault, RawMapInfo, ScriptValue};
    use dedisync_store::{InMemoryStore, MedalTimes, MetadataRow};
    use std::sync::atomic::AtomicUsize;

    struct StubCatalog {
        lookups: AtomicUsize,
    }

    impl StubCatalog {
        fn new() -> Self {
            Self {
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl CatalogClient for StubCatalog {
        fn lookup(&self, uid: &str) -> EngineResult<MetadataRow> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(MetadataRow {
                uid: uid.into(),
                catalog_id: 1,
                online_id: format!("online-{uid}"),
                medals: MedalTimes::default(),
            })
        }
    }

    fn raw_map(uid: &str) -> RawMapInfo {
        RawMapInfo {
            uid: uid.into(),
            name: uid.to_uppercase(),
            file_name: format!("{uid}.Map.Gbx"),
            environment: "Stadium".into(),
            author: "author".into(),
            author_nickname: "Author".into(),
            gold_time: 50000,
            copper_price: 100,
            map_type: "TrackMania\\TM_Race".into(),
            map_style: String::new(),
        }
    }

    fn guarded(mock: MockRemote) -> ConnectionGuard<MockRemote> {
        let guard = ConnectionGuard::new(mock);
        guard.connect().unwrap();
        guard
    }

    #[test]
    fn signal_starts_unraised() {
        let signal = RefreshSignal::new();
        assert!(!signal.wait_and_clear(Duration::from_millis(1)));
    }

    #[test]
    fn signal_coalesces_raises() {
        let signal = RefreshSignal::new();
        signal.raise();
        signal.raise();

        assert!(signal.wait_and_clear(Duration::from_millis(1)));
        // Both raises were consumed by the one wake.
        assert!(!signal.wait_and_clear(Duration::from_millis(1)));
    }

    #[test]
    fn signal_wakes_a_parked_waiter() {
        let signal = Arc::new(RefreshSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            std::thread::spawn(move || signal.wait_and_clear(Duration::from_secs(30)))
        };
        std::thread::sleep(Duration::from_millis(50));
        signal.raise();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn pagination_stops_on_short_page() {
        let mock = MockRemote::new();
        mock.set_maps((0..18).map(|i| raw_map(&format!("uid{i}"))).collect());
        let guard = guarded(mock);
        let cache = MetadataCache::new(InMemoryStore::new(), StubCatalog::new());

        let maps = fetch_all_maps(&guard, &cache, 5).unwrap();

        // Pages of [5, 5, 5, 3]: four requests, eighteen records.
        assert_eq!(maps.len(), 18);
        assert_eq!(guard.remote().map_list_calls(), 4);
        assert_eq!(maps[17].rotation_index, 17);
        assert_eq!(maps[17].online_id, "online-uid17");
    }

    #[test]
    fn pagination_treats_malformed_page_as_end() {
        let mock = MockRemote::new();
        mock.set_maps((0..10).map(|i| raw_map(&format!("uid{i}"))).collect());
        mock.set_malformed_tail(true);
        let guard = guarded(mock);
        let cache = MetadataCache::new(InMemoryStore::new(), StubCatalog::new());

        // 10 maps in pages of 5: both pages are full, so a third request
        // goes out and comes back malformed.
        let maps = fetch_all_maps(&guard, &cache, 5).unwrap();
        assert_eq!(maps.len(), 10);
        assert_eq!(guard.remote().map_list_calls(), 3);
    }

    #[test]
    fn pagination_resolves_each_uid_once() {
        let mock = MockRemote::new();
        mock.set_maps((0..6).map(|i| raw_map(&format!("uid{i}"))).collect());
        let guard = guarded(mock);
        let catalog = StubCatalog::new();
        let cache = MetadataCache::new(InMemoryStore::new(), catalog);

        fetch_all_maps(&guard, &cache, 5).unwrap();
        assert_eq!(cache.len(), 6);
    }

    #[test]
    fn mutating_ops_require_connection() {
        let sync = Synchronizer::new(
            MockRemote::new(),
            InMemoryStore::new(),
            StubCatalog::new(),
            SyncConfig::new(),
        );

        assert!(matches!(
            sync.set_current_map(2),
            Err(EngineError::NotConnected)
        ));
        assert!(matches!(
            sync.set_max_players(16),
            Err(EngineError::NotConnected)
        ));
        assert!(sync.guard().remote().jumps().is_empty());
    }

    #[test]
    fn set_mode_settings_merges_patch_over_current() {
        let mock = MockRemote::new();
        let mut current = ScriptSettings::new();
        current.insert("S_TimeLimit".into(), ScriptValue::Int(300));
        current.insert("S_WarmUpNb".into(), ScriptValue::Int(1));
        mock.set_settings(current);

        let sync = Synchronizer::new(
            mock,
            InMemoryStore::new(),
            StubCatalog::new(),
            SyncConfig::new(),
        );
        sync.guard().connect().unwrap();

        let mut patch = ScriptSettings::new();
        patch.insert("S_TimeLimit".into(), ScriptValue::Int(600));
        sync.set_mode_settings(&patch).unwrap();

        let written = sync.guard().remote().written_settings();
        assert_eq!(written.len(), 1);
        // Patch key wins, untouched keys survive.
        assert_eq!(written[0]["S_TimeLimit"], ScriptValue::Int(600));
        assert_eq!(written[0]["S_WarmUpNb"], ScriptValue::Int(1));
    }

    #[test]
    fn rejected_settings_surface_as_settings_rejected() {
        let mock = MockRemote::new();
        mock.set_settings_accepted(false);
        let sync = Synchronizer::new(
            mock,
            InMemoryStore::new(),
            StubCatalog::new(),
            SyncConfig::new(),
        );
        sync.guard().connect().unwrap();

        let err = sync.set_mode_settings(&ScriptSettings::new()).unwrap_err();
        assert!(matches!(err, EngineError::SettingsRejected));
    }

    #[test]
    fn remote_fault_wraps_into_remote_operation_failed() {
        let mock = MockRemote::new();
        mock.set_fault("JumpToMapIndex", ProtocolFault::new(-1000, "no such index"));
        let sync = Synchronizer::new(
            mock,
            InMemoryStore::new(),
            StubCatalog::new(),
            SyncConfig::new(),
        );
        sync.guard().connect().unwrap();

        let err = sync.set_current_map(42).unwrap_err();
        assert!(matches!(err, EngineError::RemoteOperationFailed { .. }));
    }

    #[test]
    fn failed_connect_leaves_synchronizer_reusable() {
        let mock = MockRemote::new();
        mock.set_fault("GetServerName", ProtocolFault::transport("boom"));
        mock.set_players(vec![PlayerEntry::new("//header//")]);
        mock.set_max_players_info(MaxPlayersInfo {
            current_value: 32,
            next_value: 32,
        });

        let sync = Synchronizer::new(
            mock,
            InMemoryStore::new(),
            StubCatalog::new(),
            SyncConfig::new(),
        );

        assert!(sync.connect().is_err());
        assert_eq!(sync.phase(), SyncPhase::Disconnected);
        assert!(sync.state().is_none());

        // The failure released the connect slot; a repaired remote can
        // try again.
        sync.guard().remote().clear_fault("GetServerName");
        sync.connect().unwrap();
        assert_eq!(sync.phase(), SyncPhase::Synchronizing);
        assert!(sync.state().is_some());
    }

    #[test]
    fn double_connect_is_rejected() {
        let mock = MockRemote::new();
        mock.set_players(vec![PlayerEntry::new("//header//")]);
        let sync = Synchronizer::new(
            mock,
            InMemoryStore::new(),
            StubCatalog::new(),
            SyncConfig::new(),
        );

        sync.connect().unwrap();
        assert!(matches!(
            sync.connect(),
            Err(EngineError::AlreadyConnected)
        ));
    }
}
