use crate::{
    background::{scheduler, LoopGuard, Simulation},
    core::{
        config::{CrowdMapConfig, DataSourceKind},
        geo::{LatLng, Point},
        notice::{keys, Notice, NoticeBoard, NoticeSeverity},
        viewport::Viewport,
    },
    data::{
        crowd::{CrowdPoint, DataOrigin},
        mock::MockCrowdSource,
        source::{CrowdDataAdapter, CrowdDataSource, CrowdFetch, HttpCrowdSource, StaticCrowdSource},
    },
    geolocation::{self, CachedGeolocation, GeolocationProvider, IpGeolocation},
    layers::marker::MarkerLayer,
    runtime::AsyncSpawner,
    traits::{CenterOutcome, LocationCentering, LocationSearch},
    Result,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;

const DATA_ERROR_MESSAGE: &str = "Failed to load crowd data. Using fallback data.";
const INITIAL_SIZE: Point = Point { x: 800.0, y: 600.0 };

/// The point set currently on the map
///
/// `fetched` is exactly what the data source last returned; `points` is what
/// is displayed, i.e. `fetched` after `jitter_ticks` rounds of simulation.
/// Both are swapped as a whole, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CrowdSnapshot {
    pub fetched: Arc<Vec<CrowdPoint>>,
    pub points: Arc<Vec<CrowdPoint>>,
    pub origin: DataOrigin,
    pub revision: u64,
    pub jitter_ticks: u32,
    pub fetched_at: Option<Instant>,
}

impl Default for CrowdSnapshot {
    fn default() -> Self {
        Self {
            fetched: Arc::new(Vec::new()),
            points: Arc::new(Vec::new()),
            origin: DataOrigin::Empty,
            revision: 0,
            jitter_ticks: 0,
            fetched_at: None,
        }
    }
}

impl CrowdSnapshot {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything a renderer needs, behind one lock
#[derive(Debug)]
pub struct MapState {
    viewport: Viewport,
    markers: MarkerLayer,
    notices: NoticeBoard,
    snapshot: CrowdSnapshot,
    loading: bool,
    refreshes_in_flight: usize,
    revision: u64,
}

impl MapState {
    fn new(config: &CrowdMapConfig) -> Self {
        let mut viewport = Viewport::new(config.default_center, config.default_zoom, INITIAL_SIZE);
        viewport.set_zoom_limits(0.0, f64::from(config.tiles.max_zoom));

        Self {
            viewport,
            markers: MarkerLayer::new(config.marker_match_tolerance),
            notices: NoticeBoard::new(),
            snapshot: CrowdSnapshot::default(),
            loading: true,
            refreshes_in_flight: 0,
            revision: 0,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.active()
    }

    pub fn snapshot(&self) -> &CrowdSnapshot {
        &self.snapshot
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Bumped on every change a renderer should see
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn replace_points(&mut self, snapshot: CrowdSnapshot) {
        self.markers.sync(&snapshot.points);
        self.snapshot = snapshot;
    }
}

type SearchObserver = Arc<dyn Fn(&str) + Send + Sync>;

struct Shared {
    config: CrowdMapConfig,
    adapter: CrowdDataAdapter,
    geolocation: Arc<dyn GeolocationProvider>,
    state: Mutex<MapState>,
    simulation: Mutex<Simulation>,
    changes: watch::Sender<u64>,
    on_location_search: Mutex<Option<SearchObserver>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// The crowd map view model
///
/// Owns the viewport, the displayed points and their markers. [`start`]
/// spawns the refresh and simulation loops; everything else goes through
/// the cloneable [`CrowdMapHandle`].
///
/// [`start`]: CrowdMap::start
pub struct CrowdMap {
    handle: CrowdMapHandle,
    spawner: Arc<dyn AsyncSpawner>,
}

impl CrowdMap {
    pub fn new(
        config: CrowdMapConfig,
        adapter: CrowdDataAdapter,
        geolocation: Arc<dyn GeolocationProvider>,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Self {
        let simulation = Simulation::new(config.jitter);
        Self::with_simulation(config, adapter, geolocation, spawner, simulation)
    }

    /// Like [`CrowdMap::new`] with a caller-provided (e.g. seeded) simulation
    pub fn with_simulation(
        config: CrowdMapConfig,
        adapter: CrowdDataAdapter,
        geolocation: Arc<dyn GeolocationProvider>,
        spawner: Arc<dyn AsyncSpawner>,
        simulation: Simulation,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        let state = MapState::new(&config);
        log::debug!(
            "Crowd map created at {:?} zoom {} using {} data",
            config.default_center,
            config.default_zoom,
            adapter.source_name()
        );

        let shared = Arc::new(Shared {
            config,
            adapter,
            geolocation,
            state: Mutex::new(state),
            simulation: Mutex::new(simulation),
            changes,
            on_location_search: Mutex::new(None),
        });

        Self {
            handle: CrowdMapHandle { shared },
            spawner,
        }
    }

    /// Builds the data source and geolocation provider `config` asks for
    pub fn from_config(config: CrowdMapConfig, spawner: Arc<dyn AsyncSpawner>) -> Result<Self> {
        config.validate()?;

        let source: Arc<dyn CrowdDataSource> = match config.data_source {
            DataSourceKind::Http => Arc::new(HttpCrowdSource::new(
                config.endpoint.clone(),
                config.request_timeout,
            )?),
            DataSourceKind::Mock => Arc::new(MockCrowdSource::new()),
            DataSourceKind::Fallback => {
                Arc::new(StaticCrowdSource::new(config.fallback_points.clone()))
            }
        };
        log::info!("Using {} crowd data source", config.data_source);

        let adapter = CrowdDataAdapter::with_fallback(source, config.fallback_points.clone());
        let geolocation = Arc::new(CachedGeolocation::new(Arc::new(IpGeolocation::default())));

        Ok(Self::new(config, adapter, geolocation, spawner))
    }

    pub fn handle(&self) -> CrowdMapHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &CrowdMapConfig {
        &self.handle.shared.config
    }

    pub fn spawner(&self) -> Arc<dyn AsyncSpawner> {
        self.spawner.clone()
    }

    /// Spawns the refresh loop (first tick immediate) and the simulation loop
    ///
    /// Both stop when the returned guard is stopped or dropped. Requests
    /// already in flight finish on their own and are bounded by their
    /// timeouts.
    pub fn start(&self) -> LoopGuard {
        let config = &self.handle.shared.config;
        let mut guard = LoopGuard::new();

        let handle = self.handle.clone();
        guard.push(
            "refresh",
            scheduler::spawn_periodic(
                self.spawner.as_ref(),
                "refresh",
                config.refresh_interval,
                move || {
                    let handle = handle.clone();
                    async move {
                        handle.refresh_now().await;
                    }
                },
            ),
        );

        let handle = self.handle.clone();
        guard.push(
            "simulation",
            scheduler::spawn_delayed_periodic(
                self.spawner.as_ref(),
                "simulation",
                config.simulation_interval,
                config.simulation_interval,
                move || {
                    handle.simulate_tick();
                    async {}
                },
            ),
        );

        log::info!(
            "Crowd map started: refresh every {:?}, simulation every {:?}",
            config.refresh_interval,
            config.simulation_interval
        );
        guard
    }
}

/// Counts one refresh as in flight until its result is applied or the
/// refresh is dropped mid-await (e.g. its loop was aborted)
struct InFlightRefresh<'a> {
    handle: &'a CrowdMapHandle,
    applied: bool,
}

impl<'a> InFlightRefresh<'a> {
    fn begin(handle: &'a CrowdMapHandle) -> Self {
        handle.update(|s| {
            s.refreshes_in_flight += 1;
            s.loading = true;
        });
        Self {
            handle,
            applied: false,
        }
    }

    /// `apply_fetch` already released the count
    fn applied(mut self) {
        self.applied = true;
    }
}

impl Drop for InFlightRefresh<'_> {
    fn drop(&mut self) {
        if self.applied {
            return;
        }
        log::debug!("Refresh dropped before its result arrived");
        self.handle.update(|s| {
            s.refreshes_in_flight = s.refreshes_in_flight.saturating_sub(1);
            s.loading = s.refreshes_in_flight > 0;
        });
    }
}

/// Cloneable access to a [`CrowdMap`]
///
/// This is what the search bar, the location button and the renderer hold.
#[derive(Clone)]
pub struct CrowdMapHandle {
    shared: Arc<Shared>,
}

impl CrowdMapHandle {
    pub fn config(&self) -> &CrowdMapConfig {
        &self.shared.config
    }

    /// Runs `f` with the state locked; keep it short
    pub fn read<R>(&self, f: impl FnOnce(&MapState) -> R) -> R {
        f(&lock(&self.shared.state))
    }

    fn update<R>(&self, f: impl FnOnce(&mut MapState) -> R) -> R {
        let (result, revision) = {
            let mut state = lock(&self.shared.state);
            let result = f(&mut state);
            state.revision += 1;
            (result, state.revision)
        };
        self.shared.changes.send_replace(revision);
        result
    }

    /// Receiver that changes whenever the state does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.read(|s| s.revision)
    }

    pub fn snapshot(&self) -> CrowdSnapshot {
        self.read(|s| s.snapshot.clone())
    }

    pub fn points(&self) -> Arc<Vec<CrowdPoint>> {
        self.read(|s| s.snapshot.points.clone())
    }

    pub fn viewport(&self) -> Viewport {
        self.read(|s| s.viewport.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.loading)
    }

    /// Active notices, after dropping expired ones
    pub fn notices(&self) -> Vec<Notice> {
        let mut state = lock(&self.shared.state);
        state.notices.prune(Instant::now());
        state.notices.active().to_vec()
    }

    pub fn dismiss_notice(&self, id: u64) -> bool {
        self.update(|s| s.notices.dismiss(id))
    }

    /// Registers an observer called with every search term
    pub fn set_on_location_search(&self, observer: impl Fn(&str) + Send + Sync + 'static) {
        *lock(&self.shared.on_location_search) = Some(Arc::new(observer));
    }

    /// Fetches once and swaps the result in
    ///
    /// Calls may overlap with each other and with the refresh loop; every
    /// result is applied as a whole, so the last one to arrive wins.
    pub async fn refresh_now(&self) -> DataOrigin {
        let in_flight = InFlightRefresh::begin(self);
        let fetch = self.shared.adapter.fetch().await;
        let origin = fetch.origin;
        self.apply_fetch(fetch);
        in_flight.applied();
        origin
    }

    fn apply_fetch(&self, fetch: CrowdFetch) {
        let CrowdFetch {
            points,
            origin,
            failure,
        } = fetch;

        self.update(|s| {
            s.refreshes_in_flight = s.refreshes_in_flight.saturating_sub(1);
            s.loading = s.refreshes_in_flight > 0;

            match failure {
                Some(_) => {
                    s.notices.push(
                        Some(keys::DATA_ERROR),
                        DATA_ERROR_MESSAGE,
                        None,
                        NoticeSeverity::Error,
                        None,
                    );
                }
                None => s.notices.clear_key(keys::DATA_ERROR),
            }

            let points = Arc::new(points);
            let snapshot = CrowdSnapshot {
                fetched: points.clone(),
                points,
                origin,
                revision: s.snapshot.revision + 1,
                jitter_ticks: 0,
                fetched_at: Some(Instant::now()),
            };
            log::debug!(
                "Applied {} points ({:?}), snapshot revision {}",
                snapshot.points.len(),
                origin,
                snapshot.revision
            );
            s.replace_points(snapshot);
        });
    }

    /// One simulation step over the displayed points
    ///
    /// Returns false when there is nothing to jitter yet.
    pub fn simulate_tick(&self) -> bool {
        let mut simulation = lock(&self.shared.simulation);
        let changes = {
            let mut state = lock(&self.shared.state);
            if state.snapshot.points.is_empty() {
                return false;
            }

            let jittered = simulation.apply(&state.snapshot.points);
            let snapshot = CrowdSnapshot {
                points: Arc::new(jittered),
                revision: state.snapshot.revision + 1,
                jitter_ticks: state.snapshot.jitter_ticks + 1,
                ..state.snapshot.clone()
            };
            state.replace_points(snapshot);
            state.revision += 1;
            state.revision
        };
        self.shared.changes.send_replace(changes);
        true
    }

    fn focus_on_term(&self, term: &str) -> Option<String> {
        let observer = lock(&self.shared.on_location_search).clone();
        if let Some(observer) = observer {
            observer(term);
        }

        // a blank term would match every label; treat it as no search at all
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let found = self.read(|s| {
            s.snapshot
                .points
                .iter()
                .find(|p| p.matches(&needle))
                .cloned()
        });

        let Some(point) = found else {
            log::debug!("No crowd point matches '{term}'");
            return None;
        };

        let zoom = self.shared.config.focus_zoom;
        self.update(|s| {
            let position = point.position();
            s.viewport.set_view(position, zoom);
            if !s.markers.open_popup_at(&position) {
                log::debug!("No marker at {position:?} for '{}'", point.label);
            }
        });
        log::info!("Focused '{}' for search '{term}'", point.label);
        Some(point.label)
    }

    async fn center_on_device(&self) -> CenterOutcome {
        let options = self.shared.config.geolocation;
        let located = geolocation::locate(self.shared.geolocation.as_ref(), &options).await;
        let ttl = Some(self.shared.config.notice_ttl);

        match located {
            Ok(position) => {
                let zoom = self.shared.config.focus_zoom;
                self.update(|s| {
                    s.viewport.set_view(position.coords, zoom);
                    s.notices.push(
                        Some(keys::LOCATION),
                        "Location found",
                        Some("Map centered to your current location".to_string()),
                        NoticeSeverity::Info,
                        ttl,
                    );
                });
                log::info!("Centered on current location {:?}", position.coords);
                CenterOutcome::CurrentLocation(position.coords)
            }
            Err(e) => {
                log::warn!("Error getting location: {e}");
                let center = self.shared.config.default_center;
                let zoom = self.shared.config.default_zoom;
                self.update(|s| {
                    s.viewport.set_view(center, zoom);
                    s.notices.push(
                        Some(keys::LOCATION),
                        "Location unavailable",
                        Some("Centered to default location instead".to_string()),
                        NoticeSeverity::Warning,
                        ttl,
                    );
                });
                CenterOutcome::DefaultLocation(center)
            }
        }
    }

    pub fn set_size(&self, size: Point) {
        let unchanged = self.read(|s| s.viewport.size == size);
        if !unchanged {
            self.update(|s| s.viewport.set_size(size));
        }
    }

    /// Drag by `delta` screen pixels
    pub fn pan(&self, delta: Point) {
        self.update(|s| s.viewport.pan(delta));
    }

    pub fn set_view(&self, center: LatLng, zoom: f64) {
        self.update(|s| s.viewport.set_view(center, zoom));
    }

    /// Zooms keeping the geographic point under `focus` fixed on screen
    pub fn zoom_around(&self, zoom: f64, focus: Option<Point>) {
        self.update(|s| s.viewport.zoom_around(zoom, focus));
    }

    pub fn zoom_in(&self) {
        self.update(|s| {
            let zoom = s.viewport.zoom.round() + 1.0;
            s.viewport.set_zoom(zoom);
        });
    }

    pub fn zoom_out(&self) {
        self.update(|s| {
            let zoom = s.viewport.zoom.round() - 1.0;
            s.viewport.set_zoom(zoom);
        });
    }

    /// Opens the popup of the marker under `pixel`, or closes the open one
    pub fn click(&self, pixel: Point) -> Option<usize> {
        self.update(|s| match s.markers.hit_test(&pixel, &s.viewport) {
            Some(index) => {
                s.markers.open_popup_by_index(index);
                Some(index)
            }
            None => {
                s.markers.close_popup();
                None
            }
        })
    }

    pub fn close_popup(&self) {
        self.update(|s| s.markers.close_popup());
    }

    /// Waits for the next state change, up to `timeout`
    pub async fn changed_within(&self, timeout: Duration) -> bool {
        let mut rx = self.subscribe();
        rx.borrow_and_update();
        matches!(tokio::time::timeout(timeout, rx.changed()).await, Ok(Ok(())))
    }
}

impl LocationSearch for CrowdMapHandle {
    fn search_and_focus(&self, term: &str) -> Option<String> {
        self.focus_on_term(term)
    }
}

#[async_trait]
impl LocationCentering for CrowdMapHandle {
    async fn center_to_current_or_default_location(&self) -> CenterOutcome {
        self.center_on_device().await
    }
}

impl std::fmt::Debug for CrowdMapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdMapHandle")
            .field("source", &self.shared.adapter.source_name())
            .field("revision", &self.revision())
            .finish()
    }
}
