//! Reacts to collision and world-mutation events by marking grid dirty
//! regions and evicting affected cache entries.
//!
//! Per the specification's design notes, this does not hold an owning
//! reference back to the dispatcher (that would recreate the
//! dispatcher/listener cycle the teacher's ECS-resource wiring avoids only
//! by virtue of everything being a global `Resource`). Instead the
//! dispatcher owns this listener outright and calls its methods directly
//! with the grid and cache it already holds — composition instead of a
//! back-reference.

use crate::nav::cache::PathCache;
use crate::nav::grid::Grid;
use crate::nav::types::{Cell, Vec2};
use std::sync::atomic::{AtomicU64, Ordering};

/// Signals the dispatcher should act on, returned instead of performed
/// directly so the listener never needs to know how a rebuild is
/// scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildTrigger {
    None,
    Full,
}

#[derive(Default)]
pub struct InvalidationListener {
    collision_version: AtomicU64,
}

impl InvalidationListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collision_version(&self) -> u64 {
        self.collision_version.load(Ordering::Relaxed)
    }

    /// `CollisionObstacleChanged`: mark a disc-shaped dirty region (one
    /// single-cell `DirtyRegion` per qualifying cell, following the same
    /// `world.distance(center) <= radius` test `Grid::add_weight_circle`
    /// uses) and evict cache entries whose path passes within `radius` of
    /// `position`. Safe to call even if `grid`/`cache` are momentarily
    /// inconsistent with each other — each mutation is independently
    /// no-op-safe.
    pub fn on_collision_obstacle_changed(&self, grid: &Grid, cache: &PathCache, position: Vec2, radius: f32) {
        self.collision_version.fetch_add(1, Ordering::Relaxed);
        let center = grid.world_to_grid(position);
        let cell_radius = (radius / grid.cell_size).ceil() as i64;
        let cx = center.x as i64;
        let cy = center.y as i64;
        for dy in -cell_radius..=cell_radius {
            for dx in -cell_radius..=cell_radius {
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 {
                    continue;
                }
                let cell = Cell::new(x as u32, y as u32);
                if !grid.in_bounds(cell) {
                    continue;
                }
                if grid.grid_to_world(cell).distance(position) <= radius {
                    grid.mark_dirty_region(cell.x, cell.y, 1, 1);
                }
            }
        }
        cache.evict_near(position, radius);
    }

    /// `WorldLoaded`: clear the cache and request a full (non-incremental)
    /// rebuild. Auto-tuning and pre-warming follow automatically once the
    /// dispatcher finishes that rebuild.
    pub fn on_world_loaded(&self, cache: &PathCache) -> RebuildTrigger {
        cache.clear();
        RebuildTrigger::Full
    }

    /// `WorldUnloaded`: acknowledged only. Transient state is assumed
    /// already cleared by `prepareForStateTransition`.
    pub fn on_world_unloaded(&self) -> RebuildTrigger {
        RebuildTrigger::None
    }

    /// `TileChanged`: mark a single-cell dirty region and evict cache
    /// entries passing within `1.5 * tile_world_size` of the tile's
    /// center.
    pub fn on_tile_changed(&self, grid: &Grid, cache: &PathCache, tile_x: u32, tile_y: u32, tile_world_size: f32) {
        grid.mark_dirty_region(tile_x, tile_y, 1, 1);
        let center = Vec2::new(
            (tile_x as f32 + 0.5) * tile_world_size,
            (tile_y as f32 + 0.5) * tile_world_size,
        );
        cache.evict_near(center, 1.5 * tile_world_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::types::Vec2;

    #[test]
    fn collision_event_evicts_intersecting_cache_entry() {
        let grid = Grid::new(20, 20, 64.0, Vec2::ZERO);
        let cache = PathCache::new(16);
        cache.insert(1, vec![Vec2::new(320.0, 320.0)]);
        let listener = InvalidationListener::new();
        listener.on_collision_obstacle_changed(&grid, &cache, Vec2::new(320.0, 320.0), 96.0);
        assert!(cache.get(1).is_none());
        assert!(grid.has_dirty_regions());
    }

    #[test]
    fn world_loaded_clears_cache_and_requests_full_rebuild() {
        let cache = PathCache::new(16);
        cache.insert(1, vec![Vec2::ZERO]);
        let listener = InvalidationListener::new();
        let trigger = listener.on_world_loaded(&cache);
        assert_eq!(trigger, RebuildTrigger::Full);
        assert!(cache.is_empty());
    }
}
