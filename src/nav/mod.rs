//! Navigation core: grid representation, A* search, request dispatch and
//! cache/event wiring. See `SPEC_FULL.md` for the full component design.

mod cache;
mod config;
mod dispatcher;
mod error;
mod event_bus;
mod grid;
mod invalidation;
mod search;
mod stats;
mod tile_source;
mod types;
mod worker_pool;

pub use cache::{PathCache, PathCacheEntry};
pub use config::{NavConfig, TunedParams};
pub use dispatcher::Dispatcher;
pub use error::NavError;
pub use event_bus::{EventBus, LocalEventBus, NavEvent, SubscriptionToken};
pub use grid::{DirtyRegion, Grid};
pub use invalidation::{InvalidationListener, RebuildTrigger};
pub use search::{SearchEngine, SearchParams};
pub use stats::{Stats, StatsSnapshot};
pub use tile_source::{GridTileSource, TileKind, TileSource};
pub use types::{Cell, CellRect, EntityId, PathRequest, Priority, RequestId, SearchResult, SlotIndex, Vec2, Waypoint};
pub use worker_pool::{BevyTaskPool, InlineWorkerPool, WorkerPool};
