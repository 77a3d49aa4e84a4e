//! End-to-end tests for the synchronizer against a scripted remote.

use dedisync_engine::{
    CatalogClient, EngineError, EngineResult, HttpClient, HttpError, Medal, MedalTimes,
    MetadataRow, RecordResolver, SyncConfig, SyncPhase, Synchronizer, UserToken,
};
use dedisync_remote::{
    MaxPlayersInfo, MockRemote, PlayerEntry, RawMapInfo, ScriptSettings, ScriptValue,
};
use dedisync_store::InMemoryStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Catalog stub with realistic medal thresholds and a lookup counter.
struct StubCatalog {
    lookups: AtomicUsize,
}

impl StubCatalog {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            lookups: AtomicUsize::new(0),
        })
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CatalogClient for StubCatalog {
    fn lookup(&self, uid: &str) -> EngineResult<MetadataRow> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(MetadataRow {
            uid: uid.into(),
            catalog_id: 7000,
            online_id: format!("online-{uid}"),
            medals: MedalTimes {
                author: 45000,
                gold: 50000,
                silver: 55000,
                bronze: 60000,
            },
        })
    }
}

/// Serves one canned body for every request and records them.
struct CannedHttp {
    body: &'static str,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl CannedHttp {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl HttpClient for CannedHttp {
    fn get(&self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, HttpError> {
        self.requests
            .lock()
            .push((url.to_string(), bearer.map(str::to_string)));
        Ok(self.body.as_bytes().to_vec())
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

fn scripted_remote(map_count: usize) -> MockRemote {
    let mock = MockRemote::new();
    mock.set_server_name("Evening Rotation");
    mock.set_maps((0..map_count).map(|i| raw_map(&format!("uid{i}"))).collect());
    mock.set_current_index(1);
    mock.set_players(vec![
        PlayerEntry::new("//server//"),
        PlayerEntry::new("alpha"),
        PlayerEntry::new("beta"),
    ]);
    mock.set_max_players_info(MaxPlayersInfo {
        current_value: 32,
        next_value: 32,
    });
    let mut settings = ScriptSettings::new();
    settings.insert("S_TimeLimit".into(), ScriptValue::Int(300));
    mock.set_settings(settings);
    mock
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let until = Instant::now() + deadline;
    while Instant::now() < until {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn connect_publishes_a_complete_snapshot() {
    let catalog = StubCatalog::new();
    let sync = Synchronizer::new(
        scripted_remote(3),
        InMemoryStore::new(),
        Arc::clone(&catalog),
        SyncConfig::new(),
    );

    assert_eq!(sync.phase(), SyncPhase::Disconnected);
    assert!(sync.state().is_none());

    sync.connect().unwrap();
    assert_eq!(sync.phase(), SyncPhase::Synchronizing);

    let state = sync.state().unwrap();
    assert_eq!(state.server_name, "Evening Rotation");
    assert_eq!(state.maps.len(), 3);
    assert_eq!(state.players, vec!["alpha", "beta"]);
    assert_eq!(state.current_map_index, 1);
    assert_eq!(state.mode_settings.time_limit, 300);
    assert_eq!(state.max_players, 32);

    // Catalog metadata was attached to every rotation entry.
    let current = state.current_map().unwrap();
    assert_eq!(current.uid, "uid1");
    assert_eq!(current.online_id, "online-uid1");
    assert_eq!(current.catalog_id, 7000);
    assert_eq!(current.medals.gold, 50000);
    assert_eq!(catalog.lookups(), 3);
}

#[test]
fn resyncs_reuse_cached_metadata() {
    let catalog = StubCatalog::new();
    let sync = Synchronizer::new(
        scripted_remote(3),
        InMemoryStore::new(),
        Arc::clone(&catalog),
        SyncConfig::new(),
    );
    sync.connect().unwrap();
    assert_eq!(catalog.lookups(), 3);

    sync.request_refresh();
    assert!(wait_until(Duration::from_secs(5), || {
        sync.stats().passes_completed >= 1
    }));

    // The resync re-pulled the rotation but hit the cache for every UID.
    assert_eq!(catalog.lookups(), 3);
}

#[test]
fn refresh_observes_a_remote_jump() {
    let sync = Synchronizer::new(
        scripted_remote(3),
        InMemoryStore::new(),
        StubCatalog::new(),
        SyncConfig::new(),
    );
    sync.connect().unwrap();

    // Let the first loop pass finish so the loop is parked on its timer
    // before the jump.
    assert!(wait_until(Duration::from_secs(5), || {
        sync.stats().passes_completed >= 1
    }));

    sync.set_current_map(2).unwrap();
    // The jump alone does not touch the snapshot.
    assert_eq!(sync.state().unwrap().current_map_index, 1);

    sync.request_refresh();
    assert!(wait_until(Duration::from_secs(5), || {
        sync.state().unwrap().current_map_index == 2
    }));
    assert_eq!(sync.state().unwrap().current_map().unwrap().uid, "uid2");
}

#[test]
fn coalesced_refreshes_cause_one_extra_pass() {
    let mock = scripted_remote(3);
    // Slow every remote call down so both raises land while the first
    // loop pass is still in flight.
    mock.set_latency(Duration::from_millis(200));
    let sync = Synchronizer::new(
        mock,
        InMemoryStore::new(),
        StubCatalog::new(),
        SyncConfig::new(),
    );
    sync.connect().unwrap();

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(sync.stats().passes_completed, 0);
    sync.request_refresh();
    sync.request_refresh();

    // First pass, then exactly one signalled pass.
    assert!(wait_until(Duration::from_secs(10), || {
        sync.stats().passes_completed == 2
    }));
    std::thread::sleep(Duration::from_secs(2));
    assert_eq!(sync.stats().passes_completed, 2);
}

#[test]
fn disconnect_leaves_a_stale_readable_snapshot() {
    let sync = Synchronizer::new(
        scripted_remote(3),
        InMemoryStore::new(),
        StubCatalog::new(),
        SyncConfig::new(),
    );
    sync.connect().unwrap();
    let before = sync.state().unwrap();

    sync.disconnect();
    sync.request_refresh();

    assert!(wait_until(Duration::from_secs(5), || {
        sync.stats().last_error.is_some()
    }));

    // Mutations are rejected up front, the snapshot stays readable.
    assert!(matches!(
        sync.set_max_players(16),
        Err(EngineError::NotConnected)
    ));
    assert_eq!(sync.state().unwrap(), before);
}

#[test]
fn records_classify_against_published_thresholds() {
    let sync = Synchronizer::new(
        scripted_remote(2),
        InMemoryStore::new(),
        StubCatalog::new(),
        SyncConfig::new(),
    );
    sync.connect().unwrap();
    let state = sync.state().unwrap();

    let http = CannedHttp::new(
        r#"[{"mapId":"online-uid0","time":52000},{"mapId":"online-uid1","time":61000}]"#,
    );
    let resolver = RecordResolver::new(http, "https://records.test");
    let records = resolver
        .resolve_records(&UserToken::new("tok"), &state.maps)
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records["online-uid0"].medal, Medal::Silver);
    assert_eq!(records["online-uid1"].medal, Medal::None);
}
