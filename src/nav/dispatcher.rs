//! Request routing: cache lookup, endpoint normalization, worker-pool
//! submission, auto-tuning and pre-warming.
//!
//! This is the piece the specification's design notes ask to be
//! de-singletonized: the teacher wires its equivalent systems
//! (`src/game/pathfinding/systems.rs`) through Bevy `Res`/`ResMut`
//! globals gated by a `PathfindingPlugin`. Here the dispatcher is an
//! explicit, constructible object — an `Arc<Dispatcher>` held by whoever
//! wants to submit requests — with its worker pool, tile source and event
//! bus injected at construction instead of resolved as ambient resources.

use crate::nav::cache::{cache_key, normalize_endpoints, PathCache};
use crate::nav::config::{NavConfig, TunedParams};
use crate::nav::error::NavError;
use crate::nav::event_bus::{EventBus, NavEvent, SubscriptionToken};
use crate::nav::grid::Grid;
use crate::nav::invalidation::{InvalidationListener, RebuildTrigger};
use crate::nav::search::{SearchEngine, SearchParams};
use crate::nav::stats::{Stats, StatsSnapshot};
use crate::nav::tile_source::TileSource;
use crate::nav::types::{EntityId, Priority, RequestId, SearchResult, SlotIndex, Vec2};
use crate::nav::worker_pool::WorkerPool;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};
use std::time::{Duration, Instant};

type Callback = Box<dyn FnOnce(SearchResult, Vec<Vec2>) + Send + 'static>;

/// A request whose dispatch was deferred because the per-frame budget
/// (`max_paths_per_frame`) was already spent; drained by `update`.
struct PendingRequest {
    start: Vec2,
    goal: Vec2,
    priority: Priority,
    callback: Option<Callback>,
    slot: Option<SlotIndex>,
}

pub struct Dispatcher {
    config: NavConfig,
    max_iterations: AtomicU32,
    diagonal_movement: AtomicBool,
    tuned: RwLock<TunedParams>,
    live_grid: RwLock<Arc<Grid>>,
    cache: PathCache,
    worker_pool: Arc<dyn WorkerPool>,
    tile_source: Arc<dyn TileSource>,
    event_bus: Arc<dyn EventBus>,
    listener: InvalidationListener,
    stats: Stats,
    slots: RwLock<FxHashMap<u32, Vec<Vec2>>>,
    next_request_id: AtomicU64,
    max_paths_per_frame: AtomicU32,
    dispatched_this_frame: AtomicU32,
    pending_requests: Mutex<VecDeque<PendingRequest>>,
    paused: AtomicBool,
    shutdown: AtomicBool,
    initialized: AtomicBool,
    subscription: Mutex<Option<SubscriptionToken>>,
    /// Set once, immediately after construction, so methods that must hand
    /// an owned `Arc<Self>` to a `'static` worker-pool closure (rather than
    /// borrow `self` for an unknown lifetime) can obtain one without every
    /// caller threading an `Arc<Dispatcher>` through. Arbitrary self types
    /// only permit `self: Arc<Self>` by value on stable, not `&Arc<Self>`,
    /// so this is the standard workaround.
    self_weak: OnceLock<Weak<Dispatcher>>,
}

impl Dispatcher {
    /// Construct and initialize a dispatcher: validates `config`,
    /// subscribes to the event bus, and performs an initial grid build if
    /// the tile source already has an active world.
    pub fn new(
        config: NavConfig,
        worker_pool: Arc<dyn WorkerPool>,
        tile_source: Arc<dyn TileSource>,
        event_bus: Arc<dyn EventBus>,
    ) -> Result<Arc<Self>, NavError> {
        config.validate()?;
        let max_iterations = AtomicU32::new(config.max_iterations);
        let diagonal_movement = AtomicBool::new(config.diagonal_movement);
        let placeholder_grid = Arc::new(Grid::new(1, 1, config.cell_size, Vec2::ZERO));
        let tuned = TunedParams::recompute(config.cell_size, config.cell_size, config.cell_size);

        let cache = PathCache::new(config.cache_capacity);
        if let Some(ttl_seconds) = config.cache_ttl_seconds {
            cache.set_ttl(Duration::from_secs_f32(ttl_seconds.max(1.0)));
        }
        let max_paths_per_frame = config.max_paths_per_frame;
        let dispatcher = Arc::new(Self {
            config,
            max_iterations,
            diagonal_movement,
            tuned: RwLock::new(tuned),
            live_grid: RwLock::new(placeholder_grid),
            cache,
            worker_pool,
            tile_source,
            event_bus,
            listener: InvalidationListener::new(),
            stats: Stats::new(),
            slots: RwLock::new(FxHashMap::default()),
            next_request_id: AtomicU64::new(1),
            max_paths_per_frame: AtomicU32::new(max_paths_per_frame),
            dispatched_this_frame: AtomicU32::new(0),
            pending_requests: Mutex::new(VecDeque::new()),
            paused: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            subscription: Mutex::new(None),
            self_weak: OnceLock::new(),
        });

        dispatcher.self_weak.set(Arc::downgrade(&dispatcher)).ok();
        dispatcher.subscribe_to_events();
        if dispatcher.tile_source.has_active_world() {
            dispatcher.rebuild_full();
        }
        dispatcher.initialized.store(true, Ordering::Release);
        Ok(dispatcher)
    }

    /// Clone out the `Arc<Self>` set during construction, for handing to a
    /// `'static` worker-pool closure.
    fn self_arc(&self) -> Arc<Self> {
        self.self_weak
            .get()
            .expect("self_weak set before any method runs")
            .upgrade()
            .expect("dispatcher outlives its own closures")
    }

    fn subscribe_to_events(&self) {
        let weak = self.self_weak.get().expect("self_weak set before subscribe").clone();
        let token = self.event_bus.subscribe(Box::new(move |event| {
            if let Some(dispatcher) = weak.upgrade() {
                dispatcher.handle_event(event);
            }
        }));
        *self.subscription.lock().unwrap() = Some(token);
    }

    fn handle_event(&self, event: &NavEvent) {
        if !self.initialized.load(Ordering::Acquire) {
            return;
        }
        let grid = self.live_grid.read().unwrap().clone();
        match *event {
            NavEvent::CollisionObstacleChanged { position, radius, description } => {
                tracing::debug!(?position, radius, description, "collision obstacle changed");
                self.listener.on_collision_obstacle_changed(&grid, &self.cache, position, radius);
            }
            NavEvent::WorldLoaded { width, height } => {
                tracing::info!(width, height, "world loaded");
                if self.listener.on_world_loaded(&self.cache) == RebuildTrigger::Full {
                    self.rebuild_full();
                }
            }
            NavEvent::WorldUnloaded => {
                tracing::info!("world unloaded");
                self.listener.on_world_unloaded();
            }
            NavEvent::TileChanged { tile_x, tile_y } => {
                self.listener.on_tile_changed(&grid, &self.cache, tile_x, tile_y, self.tile_source.tile_world_size());
            }
        }
    }

    // ---------------------------------------------------------------
    // Grid rebuild
    // ---------------------------------------------------------------

    /// Full rebuild, choosing sequential vs. row-partitioned-parallel the
    /// same way `rebuild_full_parallel` itself splits work: ask the worker
    /// pool for its advised row-strip count and only bother partitioning
    /// when it would actually produce more than one strip. Small worlds
    /// and `InlineWorkerPool`-backed dispatchers (tests, `findPathImmediate`
    /// callers) always resolve to one strip and take the sequential path.
    fn rebuild_full(&self) {
        let Some((_, world_h)) = self.tile_source.world_dimensions() else {
            tracing::warn!("rebuild_full: tile source has no active world");
            return;
        };
        let cells_h = (world_h / self.config.cell_size).ceil() as usize;
        let worker_count = self.worker_pool.optimal_workers(cells_h);
        let (batch_count, _) = self.worker_pool.batch_strategy(cells_h, worker_count);
        if batch_count > 1 {
            self.rebuild_full_parallel();
        } else {
            self.rebuild_full_sequential();
        }
    }

    fn rebuild_full_sequential(&self) {
        let Some(new_grid) = Grid::rebuild_from_world(self.tile_source.as_ref(), self.config.cell_size) else {
            tracing::warn!("rebuild_full: tile source has no active world");
            return;
        };
        self.publish_rebuilt_grid(new_grid);
    }

    /// Partitions rebuild work across the worker pool's advised row
    /// strips and joins on completion, following the teacher's use of
    /// `bevy_tasks` task pools for background simulation work. Called
    /// automatically by `rebuild_full` for worlds large enough to split;
    /// also exposed directly for embedders that want to force it.
    pub fn rebuild_full_parallel(&self) {
        let Some((world_w, world_h)) = self.tile_source.world_dimensions() else {
            tracing::warn!("rebuild_full_parallel: tile source has no active world");
            return;
        };
        let cells_w = (world_w / self.config.cell_size).ceil() as u32;
        let cells_h = (world_h / self.config.cell_size).ceil() as u32;
        let grid = Arc::new(Mutex::new(Grid::initialize_arrays(cells_w, cells_h, self.config.cell_size, Vec2::ZERO)));

        let worker_count = self.worker_pool.optimal_workers(cells_h as usize);
        let (batch_count, batch_size) = self.worker_pool.batch_strategy(cells_h as usize, worker_count);

        if batch_count <= 1 {
            grid.lock().unwrap().rebuild_strip(self.tile_source.as_ref(), 0, cells_h);
        } else {
            let mut tasks = Vec::with_capacity(batch_count);
            for batch in 0..batch_count {
                let row_start = (batch as u32) * (batch_size as u32);
                let row_end = ((batch as u32 + 1) * (batch_size as u32)).min(cells_h);
                if row_start >= row_end {
                    continue;
                }
                let grid_handle = grid.clone();
                let source = self.tile_source.clone();
                tasks.push(self.worker_pool.enqueue_with_result(
                    Priority::Normal,
                    "grid_rebuild_strip",
                    Box::new(move || {
                        grid_handle.lock().unwrap().rebuild_strip(source.as_ref(), row_start, row_end);
                    }),
                ));
            }
            for task in tasks {
                bevy_tasks::block_on(task);
            }
        }

        let mut final_grid = match Arc::try_unwrap(grid) {
            Ok(mutex) => mutex.into_inner().unwrap(),
            Err(shared) => shared.lock().unwrap().clone(),
        };
        final_grid.update_coarse_overlay();
        self.publish_rebuilt_grid(final_grid);
    }

    fn publish_rebuilt_grid(&self, new_grid: Grid) {
        let width = new_grid.width as f32 * new_grid.cell_size;
        let height = new_grid.height as f32 * new_grid.cell_size;
        *self.live_grid.write().unwrap() = Arc::new(new_grid);
        *self.tuned.write().unwrap() = TunedParams::recompute(width, height, self.config.cell_size);
        self.cache.evict_fraction(0.5);
        tracing::debug!(width, height, "grid rebuilt");
        self.prewarm();
    }

    /// Incremental rebuild of dirty regions, falling back to a full
    /// rebuild if more than `DIRTY_REBUILD_THRESHOLD` of the grid is
    /// dirty. Intended to be called periodically from `update`.
    pub fn rebuild_incremental(&self) {
        let grid = self.live_grid.read().unwrap().clone();
        if !grid.has_dirty_regions() {
            return;
        }
        if grid.dirty_percent() > crate::nav::grid::DIRTY_REBUILD_THRESHOLD {
            self.rebuild_full();
            return;
        }
        let regions = grid.take_dirty_regions();
        let mut updated = (*grid).clone();
        for region in regions {
            for y in region.y..(region.y + region.h).min(updated.height) {
                for x in region.x..(region.x + region.w).min(updated.width) {
                    let cell = crate::nav::types::Cell::new(x, y);
                    let world = updated.grid_to_world(cell);
                    updated.set_blocked(cell, !self.tile_source.is_walkable(world));
                    updated.set_weight(cell, self.tile_source.weight_at(world));
                }
            }
        }
        updated.update_coarse_overlay();
        self.publish_rebuilt_grid(updated);
    }

    /// Seed the cache between the centers of an `N x N` sector grid using
    /// 8-connectivity, forward directions only (right, down, down-right,
    /// down-left) so each unordered pair is submitted once. Total seed
    /// count is `2*N*(N-1) + 2*(N-1)^2`.
    fn prewarm(&self) {
        let tuned = *self.tuned.read().unwrap();
        let n = tuned.prewarm_sectors;
        if n < 2 {
            return;
        }
        let grid = self.live_grid.read().unwrap().clone();
        let world_w = grid.width as f32 * grid.cell_size;
        let world_h = grid.height as f32 * grid.cell_size;
        let sector_w = world_w / n as f32;
        let sector_h = world_h / n as f32;
        let center = |sx: u32, sy: u32| {
            Vec2::new((sx as f32 + 0.5) * sector_w, (sy as f32 + 0.5) * sector_h)
        };

        let mut seeds = Vec::new();
        for sy in 0..n {
            for sx in 0..n {
                if sx + 1 < n {
                    seeds.push((center(sx, sy), center(sx + 1, sy)));
                }
                if sy + 1 < n {
                    seeds.push((center(sx, sy), center(sx, sy + 1)));
                }
                if sx + 1 < n && sy + 1 < n {
                    seeds.push((center(sx, sy), center(sx + 1, sy + 1)));
                }
                if sx > 0 && sy + 1 < n {
                    seeds.push((center(sx, sy), center(sx - 1, sy + 1)));
                }
            }
        }
        tracing::debug!(count = seeds.len(), sectors = n, "pre-warming path cache");
        for (start, goal) in seeds {
            self.request_path_internal(None, start, goal, Priority::Low, None, None);
        }
    }

    // ---------------------------------------------------------------
    // Request API
    // ---------------------------------------------------------------

    pub fn request_path(
        &self,
        entity: EntityId,
        start: Vec2,
        goal: Vec2,
        priority: Priority,
        on_complete: impl FnOnce(SearchResult, Vec<Vec2>) + Send + 'static,
    ) -> RequestId {
        self.request_path_internal(Some(entity), start, goal, priority, Some(Box::new(on_complete)), None)
    }

    pub fn request_path_to_slot(&self, slot: SlotIndex, start: Vec2, goal: Vec2, priority: Priority) -> RequestId {
        self.request_path_internal(None, start, goal, priority, None, Some(slot))
    }

    pub fn read_slot(&self, slot: SlotIndex) -> Option<Vec<Vec2>> {
        self.slots.read().unwrap().get(&slot.0).cloned()
    }

    fn request_path_internal(
        &self,
        _entity: Option<EntityId>,
        start: Vec2,
        goal: Vec2,
        priority: Priority,
        callback: Option<Callback>,
        slot: Option<SlotIndex>,
    ) -> RequestId {
        if self.shutdown.load(Ordering::Acquire) {
            return RequestId(0);
        }
        let id = RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        self.stats.record_enqueued();
        if self.try_reserve_frame_budget() {
            self.dispatch_request(start, goal, priority, callback, slot);
        } else {
            self.pending_requests.lock().unwrap().push_back(PendingRequest { start, goal, priority, callback, slot });
        }
        id
    }

    /// Atomically claims one slot in the current per-frame dispatch budget,
    /// mirroring `PathfinderManager::m_maxRequestsPerUpdate`.
    fn try_reserve_frame_budget(&self) -> bool {
        let max = self.max_paths_per_frame.load(Ordering::Relaxed);
        self.dispatched_this_frame
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                if current < max {
                    Some(current + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    fn dispatch_request(&self, start: Vec2, goal: Vec2, priority: Priority, callback: Option<Callback>, slot: Option<SlotIndex>) {
        let dispatcher = self.self_arc();
        self.worker_pool.enqueue(
            priority,
            "path_request",
            Box::new(move || dispatcher.run_request(start, goal, callback, slot)),
        );
    }

    /// Resets the per-frame dispatch budget and drains up to
    /// `max_paths_per_frame` previously-deferred requests onto the worker
    /// pool. Called from `update`.
    fn drain_pending_requests(&self) {
        let max = self.max_paths_per_frame.load(Ordering::Relaxed);
        let mut ready = Vec::new();
        {
            let mut queue = self.pending_requests.lock().unwrap();
            while (ready.len() as u32) < max {
                match queue.pop_front() {
                    Some(req) => ready.push(req),
                    None => break,
                }
            }
        }
        self.dispatched_this_frame.store(ready.len() as u32, Ordering::Relaxed);
        for req in ready {
            self.dispatch_request(req.start, req.goal, req.priority, req.callback, req.slot);
        }
    }

    fn run_request(self: Arc<Self>, start: Vec2, goal: Vec2, callback: Option<Callback>, slot: Option<SlotIndex>) {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }
        let grid = self.live_grid.read().unwrap().clone();
        let tuned = *self.tuned.read().unwrap();
        let world_min = Vec2::ZERO;
        let world_max = Vec2::new(grid.width as f32 * grid.cell_size, grid.height as f32 * grid.cell_size);

        let key = cache_key(start, goal, world_min, world_max, self.config.edge_margin, tuned.cache_key_quantization);
        if let Some(path) = self.cache.get(key) {
            self.stats.record_cache_hit();
            self.deliver(path, SearchResult::Success, callback, slot);
            return;
        }
        self.stats.record_cache_miss();

        let (norm_start, norm_goal) = normalize_endpoints(
            &grid,
            start,
            goal,
            world_min,
            world_max,
            self.config.edge_margin,
            tuned.endpoint_quantization,
        );
        let engine = self.make_engine(tuned);
        let started = Instant::now();
        let (result, path) = if engine.should_use_hierarchical(&grid, norm_start, norm_goal) {
            engine.find_path_hierarchical(&grid, norm_start, norm_goal)
        } else {
            engine.find_path(&grid, norm_start, norm_goal)
        };
        let elapsed_micros = started.elapsed().as_micros() as u64;

        if self.shutdown.load(Ordering::Acquire) {
            return;
        }

        match result {
            SearchResult::Success => {
                self.stats.record_completed(elapsed_micros);
                if !path.is_empty() {
                    self.cache.insert(key, path.clone());
                }
            }
            SearchResult::Timeout => {
                self.stats.record_timeout();
                self.stats.record_failed();
                tracing::warn!(?start, ?goal, "path search timed out");
            }
            _ => self.stats.record_failed(),
        }
        self.deliver(path, result, callback, slot);
    }

    fn deliver(&self, path: Vec<Vec2>, result: SearchResult, callback: Option<Callback>, slot: Option<SlotIndex>) {
        if let Some(slot) = slot {
            self.slots.write().unwrap().insert(slot.0, path.clone());
        }
        if let Some(callback) = callback {
            callback(result, path);
        }
    }

    /// Synchronous search bypassing the worker pool and the cache,
    /// for low-frequency callers that need a result on the current
    /// thread (e.g. editor tooling). `skip_normalization` lets a caller
    /// that has already normalized its endpoints avoid doing so twice.
    pub fn find_path_immediate(&self, start: Vec2, goal: Vec2, skip_normalization: bool) -> (SearchResult, Vec<Vec2>) {
        if !self.initialized.load(Ordering::Acquire) || self.shutdown.load(Ordering::Acquire) {
            return (SearchResult::NoPathFound, Vec::new());
        }
        let grid = self.live_grid.read().unwrap().clone();
        let tuned = *self.tuned.read().unwrap();
        let (start, goal) = if skip_normalization {
            (start, goal)
        } else {
            let world_min = Vec2::ZERO;
            let world_max = Vec2::new(grid.width as f32 * grid.cell_size, grid.height as f32 * grid.cell_size);
            normalize_endpoints(&grid, start, goal, world_min, world_max, self.config.edge_margin, tuned.endpoint_quantization)
        };
        let engine = self.make_engine(tuned);
        let started = Instant::now();
        let (result, path) = if engine.should_use_hierarchical(&grid, start, goal) {
            engine.find_path_hierarchical(&grid, start, goal)
        } else {
            engine.find_path(&grid, start, goal)
        };
        let elapsed_micros = started.elapsed().as_micros() as u64;
        match result {
            SearchResult::Success => self.stats.record_completed(elapsed_micros),
            SearchResult::Timeout => {
                self.stats.record_timeout();
                self.stats.record_failed();
            }
            _ => self.stats.record_failed(),
        }
        (result, path)
    }

    fn make_engine(&self, tuned: TunedParams) -> SearchEngine {
        SearchEngine {
            params: SearchParams {
                diagonal_movement: self.diagonal_movement.load(Ordering::Relaxed),
                cost_straight: self.config.cost_straight,
                cost_diagonal: self.config.cost_diagonal,
                max_iterations: self.max_iterations.load(Ordering::Relaxed),
            },
            connectivity_probe_threshold_cells: tuned.connectivity_probe_threshold_cells,
            hierarchical_threshold_cells: tuned.hierarchical_threshold_cells,
        }
    }

    // ---------------------------------------------------------------
    // Weight fields
    // ---------------------------------------------------------------

    /// Raises weights within `radius` of `center` on the *live* grid.
    /// Copy-on-write relative to the shared handle: in-flight searches
    /// hold their own snapshot taken before this call and never observe
    /// the change, so callers do not need to serialize weight mutation
    /// against concurrent searches (see `DESIGN.md`, Open Question on
    /// weight-field mutation).
    pub fn add_temporary_weight_field(&self, center: Vec2, radius: f32, weight: f32) {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self.live_grid.write().unwrap();
        let mut grid = (**guard).clone();
        grid.add_weight_circle(center, radius, weight);
        *guard = Arc::new(grid);
    }

    pub fn clear_weight_fields(&self) {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self.live_grid.write().unwrap();
        let mut grid = (**guard).clone();
        grid.reset_weights(1.0);
        *guard = Arc::new(grid);
    }

    // ---------------------------------------------------------------
    // Control plane
    // ---------------------------------------------------------------

    pub fn set_max_iterations(&self, value: u32) -> Result<(), NavError> {
        if value == 0 {
            return Err(NavError::InvalidConfig("max_iterations must be nonzero"));
        }
        self.max_iterations.store(value, Ordering::Relaxed);
        Ok(())
    }

    pub fn set_diagonal_movement(&self, enabled: bool) {
        self.diagonal_movement.store(enabled, Ordering::Relaxed);
    }

    /// Caps how many deferred path requests `update` dispatches per call;
    /// requests beyond the budget queue until the next `update`. Mirrors
    /// `PathfinderManager::setMaxPathsPerFrame`.
    pub fn set_max_paths_per_frame(&self, value: u32) -> Result<(), NavError> {
        if value == 0 {
            return Err(NavError::InvalidConfig("max_paths_per_frame must be nonzero"));
        }
        self.max_paths_per_frame.store(value, Ordering::Relaxed);
        Ok(())
    }

    /// Sets how long an idle cache entry may go unused before it is treated
    /// as expired. Mirrors `PathfinderManager::setCacheExpirationTime`,
    /// including its 1-second floor.
    pub fn set_cache_ttl_seconds(&self, seconds: f32) {
        self.cache.set_ttl(Duration::from_secs_f32(seconds.max(1.0)));
    }

    pub fn set_global_pause(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_globally_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Call once per frame: no-ops while paused, otherwise drains any
    /// requests deferred by the per-frame budget and advances the periodic
    /// stats report.
    pub fn update(&self) {
        if self.is_globally_paused() {
            return;
        }
        self.drain_pending_requests();
        self.stats.tick(self.cache.len(), self.config.stats_report_interval);
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.cache.len())
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Stop accepting new work and unsubscribe from the event bus.
    /// In-flight tasks still observe `shutdown` at their next safe point
    /// and exit without touching dispatcher state.
    pub fn clean(&self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(token) = self.subscription.lock().unwrap().take() {
            self.event_bus.unsubscribe(token);
        }
        self.stats.reset();
    }

    pub fn prepare_for_state_transition(&self) {
        self.clean();
        self.cache.clear();
        self.slots.write().unwrap().clear();
    }
}
