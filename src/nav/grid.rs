//! The navigation grid: per-cell walkability and movement weight, plus a
//! coarse overlay used by hierarchical search.
//!
//! Structurally this plays the role the teacher's `FlowField`
//! (`src/game/structures/flow_field.rs`) plays for flow-field movement:
//! a flat `Vec` indexed by `y * width + x`, with `world_to_grid` /
//! `grid_to_world` conversions and a `255`-style sentinel for "no data".
//! The algorithm it backs is different (A* over a walkability/weight
//! field, not Dijkstra integration over a cost field), so the cell
//! representation and rebuild pipeline are new.

use crate::nav::tile_source::TileSource;
use crate::nav::types::{Cell, Vec2};
use std::sync::Mutex;

/// A rectangle of cells queued for incremental rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Fraction of dirty cells above which an incremental rebuild is abandoned
/// in favor of a full rebuild (see `Grid::dirty_percent`).
pub const DIRTY_REBUILD_THRESHOLD: f32 = 0.25;

/// Coarse cells aggregate this many fine cells per axis.
pub const COARSE_BLOCK: u32 = 4;

#[derive(Debug)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub cell_size: f32,
    pub origin: Vec2,
    walkable: Vec<bool>,
    weight: Vec<f32>,
    dirty: Mutex<Vec<DirtyRegion>>,
    coarse: Option<Box<Grid>>,
}

impl Clone for Grid {
    /// Snapshots the current dirty-region queue into the clone rather than
    /// sharing it — the dispatcher clones a grid precisely to mutate one
    /// copy while leaving the other (still shared with in-flight searches)
    /// untouched, so the two must not serialize dirty-region bookkeeping
    /// through the same mutex afterward.
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            origin: self.origin,
            walkable: self.walkable.clone(),
            weight: self.weight.clone(),
            dirty: Mutex::new(self.dirty.lock().unwrap().clone()),
            coarse: self.coarse.clone(),
        }
    }
}

impl Grid {
    /// Allocate an empty grid (all cells blocked, weight 1.0). Callers fill
    /// it via `rebuild_from_world` or by direct mutation.
    pub fn new(width: u32, height: u32, cell_size: f32, origin: Vec2) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cell_size,
            origin,
            walkable: vec![false; len],
            weight: vec![1.0; len],
            dirty: Mutex::new(Vec::new()),
            coarse: None,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// Negative offsets map to `u32::MAX` rather than clamping to 0, so a
    /// position outside the grid's lower bound still produces a cell that
    /// fails `in_bounds` instead of silently aliasing cell `(0, 0)`.
    pub fn world_to_grid(&self, pos: Vec2) -> Cell {
        let gx = ((pos.x - self.origin.x) / self.cell_size).floor();
        let gy = ((pos.y - self.origin.y) / self.cell_size).floor();
        let to_coord = |v: f32| if v < 0.0 { u32::MAX } else { v as u32 };
        Cell::new(to_coord(gx), to_coord(gy))
    }

    pub fn grid_to_world(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            self.origin.y + (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return true;
        }
        !self.walkable[self.index(cell.x, cell.y)]
    }

    pub fn weight(&self, cell: Cell) -> f32 {
        if !self.in_bounds(cell) {
            return 1.0;
        }
        self.weight[self.index(cell.x, cell.y)]
    }

    pub fn set_blocked(&mut self, cell: Cell, blocked: bool) {
        if !self.in_bounds(cell) {
            return;
        }
        let idx = self.index(cell.x, cell.y);
        self.walkable[idx] = !blocked;
    }

    pub fn set_weight(&mut self, cell: Cell, weight: f32) {
        if !self.in_bounds(cell) {
            return;
        }
        let idx = self.index(cell.x, cell.y);
        self.weight[idx] = weight.max(1.0);
    }

    pub fn reset_weights(&mut self, default: f32) {
        let default = default.max(1.0);
        for w in self.weight.iter_mut() {
            *w = default;
        }
    }

    /// Raise weights within `radius` cells of `center` to `max(current, multiplier)`.
    /// Multipliers `<= 1.0` are a no-op (weights never decrease below 1.0).
    pub fn add_weight_circle(&mut self, center: Vec2, radius: f32, multiplier: f32) {
        if multiplier <= 1.0 || radius <= 0.0 {
            return;
        }
        let center_cell = self.world_to_grid(center);
        let radius_cells = (radius / self.cell_size).ceil() as i64;
        let cx = center_cell.x as i64;
        let cy = center_cell.y as i64;
        for dy in -radius_cells..=radius_cells {
            for dx in -radius_cells..=radius_cells {
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                    continue;
                }
                let cell = Cell::new(x as u32, y as u32);
                let world = self.grid_to_world(cell);
                if world.distance(center) <= radius {
                    let idx = self.index(cell.x, cell.y);
                    self.weight[idx] = self.weight[idx].max(multiplier);
                }
            }
        }
    }

    pub fn mark_dirty_region(&self, x: u32, y: u32, w: u32, h: u32) {
        self.dirty.lock().unwrap().push(DirtyRegion { x, y, w, h });
    }

    pub fn has_dirty_regions(&self) -> bool {
        !self.dirty.lock().unwrap().is_empty()
    }

    /// Fraction of total cells covered by pending dirty regions (regions
    /// may overlap and are counted without deduplication, matching the
    /// cheap estimate the dispatcher uses to decide full-vs-incremental
    /// rebuild).
    pub fn dirty_percent(&self) -> f32 {
        let total = (self.width as u64) * (self.height as u64);
        if total == 0 {
            return 0.0;
        }
        let dirty_cells: u64 = self
            .dirty
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.w as u64) * (r.h as u64))
            .sum();
        (dirty_cells as f32 / total as f32).min(1.0)
    }

    pub fn clear_dirty_regions(&self) {
        self.dirty.lock().unwrap().clear();
    }

    pub fn take_dirty_regions(&self) -> Vec<DirtyRegion> {
        std::mem::take(&mut *self.dirty.lock().unwrap())
    }

    /// Search outward in expanding rings for the nearest walkable cell to
    /// `position`, up to `max_radius` cells. Mirrors the ring search in the
    /// teacher's `find_nearest_walkable` (`src/game/pathfinding/astar.rs`).
    pub fn snap_to_nearest_open(&self, position: Vec2, max_radius: u32) -> Option<Vec2> {
        let center = self.world_to_grid(position);
        if !self.is_blocked(center) {
            return Some(self.grid_to_world(center));
        }
        for radius in 1..=max_radius as i64 {
            let cx = center.x as i64;
            let cy = center.y as i64;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue; // ring only, interior already searched at smaller radii
                    }
                    let x = cx + dx;
                    let y = cy + dy;
                    if x < 0 || y < 0 {
                        continue;
                    }
                    let cell = Cell::new(x as u32, y as u32);
                    if self.in_bounds(cell) && !self.is_blocked(cell) {
                        return Some(self.grid_to_world(cell));
                    }
                }
            }
        }
        None
    }

    /// Allocate fresh, all-blocked cell buffers without touching the tile
    /// source. Used as the first phase of a full rebuild.
    pub fn initialize_arrays(width: u32, height: u32, cell_size: f32, origin: Vec2) -> Self {
        Self::new(width, height, cell_size, origin)
    }

    /// Populate a horizontal strip `[row_start, row_end)` from the tile
    /// source. Strips are independent and may be rebuilt concurrently by
    /// different worker-pool tasks.
    pub fn rebuild_strip<T: TileSource + ?Sized>(&mut self, source: &T, row_start: u32, row_end: u32) {
        let row_end = row_end.min(self.height);
        for gy in row_start..row_end {
            for gx in 0..self.width {
                let cell = Cell::new(gx, gy);
                let world = self.grid_to_world(cell);
                let walkable = source.is_walkable(world);
                let weight = source.weight_at(world);
                self.set_blocked(cell, !walkable);
                self.set_weight(cell, weight);
            }
        }
    }

    /// Full synchronous rebuild from the tile source. Parallel rebuild is
    /// the dispatcher's responsibility (it partitions rows across the
    /// worker pool and calls `rebuild_strip` per partition); this is the
    /// single-threaded fallback and the one the coarse overlay update
    /// always uses.
    pub fn rebuild_from_world<T: TileSource + ?Sized>(source: &T, cell_size: f32) -> Option<Self> {
        let (width, height) = source.world_dimensions()?;
        let cells_w = (width / cell_size).ceil() as u32;
        let cells_h = (height / cell_size).ceil() as u32;
        let mut grid = Self::initialize_arrays(cells_w, cells_h, cell_size, Vec2::ZERO);
        grid.rebuild_strip(source, 0, cells_h);
        grid.update_coarse_overlay();
        Some(grid)
    }

    /// Recompute the coarse overlay: each coarse cell covers a
    /// `COARSE_BLOCK x COARSE_BLOCK` block of fine cells, is walkable iff
    /// any fine cell in the block is walkable, and takes the mean weight
    /// of the walkable fine cells (or 1.0 if the block is fully blocked).
    pub fn update_coarse_overlay(&mut self) {
        let coarse_w = self.width.div_ceil(COARSE_BLOCK);
        let coarse_h = self.height.div_ceil(COARSE_BLOCK);
        let mut coarse = Grid::new(
            coarse_w,
            coarse_h,
            self.cell_size * COARSE_BLOCK as f32,
            self.origin,
        );
        for cy in 0..coarse_h {
            for cx in 0..coarse_w {
                let mut any_walkable = false;
                let mut weight_sum = 0.0f32;
                let mut walkable_count = 0u32;
                for by in 0..COARSE_BLOCK {
                    for bx in 0..COARSE_BLOCK {
                        let fx = cx * COARSE_BLOCK + bx;
                        let fy = cy * COARSE_BLOCK + by;
                        if fx >= self.width || fy >= self.height {
                            continue;
                        }
                        let cell = Cell::new(fx, fy);
                        if !self.is_blocked(cell) {
                            any_walkable = true;
                            weight_sum += self.weight(cell);
                            walkable_count += 1;
                        }
                    }
                }
                let coarse_cell = Cell::new(cx, cy);
                coarse.set_blocked(coarse_cell, !any_walkable);
                let mean_weight = if walkable_count > 0 {
                    weight_sum / walkable_count as f32
                } else {
                    1.0
                };
                coarse.set_weight(coarse_cell, mean_weight);
            }
        }
        self.coarse = Some(Box::new(coarse));
    }

    pub fn coarse(&self) -> Option<&Grid> {
        self.coarse.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tile_source::GridTileSource;

    #[test]
    fn world_to_grid_round_trips_cell_centers() {
        let grid = Grid::new(10, 10, 64.0, Vec2::ZERO);
        for y in 0..10 {
            for x in 0..10 {
                let cell = Cell::new(x, y);
                let world = grid.grid_to_world(cell);
                assert_eq!(grid.world_to_grid(world), cell);
            }
        }
    }

    #[test]
    fn reset_weights_applies_to_every_cell() {
        let mut grid = Grid::new(4, 4, 64.0, Vec2::ZERO);
        grid.reset_weights(2.5);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.weight(Cell::new(x, y)), 2.5);
            }
        }
    }

    #[test]
    fn mark_dirty_region_then_clear_leaves_no_dirty_regions() {
        let grid = Grid::new(4, 4, 64.0, Vec2::ZERO);
        grid.mark_dirty_region(0, 0, 2, 2);
        assert!(grid.has_dirty_regions());
        grid.clear_dirty_regions();
        assert!(!grid.has_dirty_regions());
    }

    #[test]
    fn coarse_overlay_walkable_iff_any_fine_cell_walkable() {
        let mut grid = Grid::new(8, 8, 64.0, Vec2::ZERO);
        let source = GridTileSource::new_open(8, 8, 64.0);
        grid.rebuild_strip(&source, 0, 8);
        grid.set_blocked(Cell::new(0, 0), true);
        grid.update_coarse_overlay();
        let coarse = grid.coarse().unwrap();
        // Block (0,0) still leaves 15 other walkable fine cells in the block.
        assert!(!coarse.is_blocked(Cell::new(0, 0)));
    }

    #[test]
    fn weight_never_drops_below_one() {
        let mut grid = Grid::new(4, 4, 64.0, Vec2::ZERO);
        grid.set_weight(Cell::new(0, 0), 0.1);
        assert_eq!(grid.weight(Cell::new(0, 0)), 1.0);
    }
}
