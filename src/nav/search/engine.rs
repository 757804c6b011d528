//! Public search surface: preflight validation, fast paths, and dispatch
//! to direct or hierarchical A*.

use super::hierarchical::{find_path_hierarchical as hierarchical_search, should_use_hierarchical as hierarchical_threshold};
use super::los::has_line_of_sight as los_check;
use super::params::SearchParams;
use super::smoothing::smooth;
use super::astar::find_path_cells;
use crate::nav::grid::Grid;
use crate::nav::types::{Cell, CellRect, SearchResult, Vec2};

const GOAL_SNAP_RADIUS: u32 = 3;
const START_SNAP_RADIUS: u32 = 4;
const CONNECTIVITY_PROBE_SAMPLES: u32 = 8;

#[derive(Clone, Copy)]
pub struct SearchEngine {
    pub params: SearchParams,
    pub connectivity_probe_threshold_cells: u32,
    pub hierarchical_threshold_cells: u32,
}

impl SearchEngine {
    pub fn has_line_of_sight(&self, grid: &Grid, a: Vec2, b: Vec2) -> bool {
        los_check(grid, a, b)
    }

    pub fn should_use_hierarchical(&self, grid: &Grid, start: Vec2, goal: Vec2) -> bool {
        hierarchical_threshold(
            grid.world_to_grid(start),
            grid.world_to_grid(goal),
            self.hierarchical_threshold_cells,
        )
    }

    pub fn find_path(&self, grid: &Grid, start: Vec2, goal: Vec2) -> (SearchResult, Vec<Vec2>) {
        self.run(grid, start, goal, false)
    }

    pub fn find_path_hierarchical(&self, grid: &Grid, start: Vec2, goal: Vec2) -> (SearchResult, Vec<Vec2>) {
        self.run(grid, start, goal, true)
    }

    fn run(&self, grid: &Grid, start_world: Vec2, goal_world: Vec2, allow_hierarchical: bool) -> (SearchResult, Vec<Vec2>) {
        let start = grid.world_to_grid(start_world);
        let goal = grid.world_to_grid(goal_world);

        if !grid.in_bounds(start) {
            return (SearchResult::InvalidStart, Vec::new());
        }
        if !grid.in_bounds(goal) {
            return (SearchResult::InvalidGoal, Vec::new());
        }

        let mut goal = goal;
        let mut goal_world = goal_world;
        if grid.is_blocked(goal) {
            match grid.snap_to_nearest_open(goal_world, GOAL_SNAP_RADIUS) {
                Some(snapped) => {
                    goal_world = snapped;
                    goal = grid.world_to_grid(snapped);
                }
                None => return (SearchResult::InvalidGoal, Vec::new()),
            }
        }

        if start == goal {
            return (SearchResult::Success, vec![grid.grid_to_world(start)]);
        }

        if los_check(grid, start_world, goal_world) {
            return (SearchResult::Success, vec![start_world, goal_world]);
        }

        let chebyshev = start.chebyshev_distance(goal);
        if chebyshev > self.connectivity_probe_threshold_cells && !self.connectivity_probe_passes(grid, start, goal) {
            return (SearchResult::NoPathFound, Vec::new());
        }

        let mut start = start;
        let mut start_world = start_world;
        if grid.is_blocked(start) {
            match grid.snap_to_nearest_open(start_world, START_SNAP_RADIUS) {
                Some(snapped) => {
                    start_world = snapped;
                    start = grid.world_to_grid(snapped);
                }
                None => return (SearchResult::NoPathFound, Vec::new()),
            }
        }

        let (result, cell_path) = if allow_hierarchical
            && hierarchical_threshold(start, goal, self.hierarchical_threshold_cells)
        {
            hierarchical_search(grid, start, goal, self.params)
        } else {
            let roi = CellRect::around(start, goal, self.roi_margin(chebyshev), grid.width, grid.height);
            find_path_cells(grid, start, goal, self.params, roi)
        };

        if result != SearchResult::Success {
            return (result, Vec::new());
        }

        let waypoints: Vec<Vec2> = cell_path.iter().map(|&c| grid.grid_to_world(c)).collect();
        (SearchResult::Success, smooth(grid, &waypoints))
    }

    fn roi_margin(&self, chebyshev_distance: u32) -> u32 {
        (chebyshev_distance / 4 + 8).min(64)
    }

    /// Sample up to 8 intermediate cells along the straight line between
    /// `start` and `goal`; reject the query if more than half of the
    /// samples have no walkable 8-neighbor (a cheap signal that the line
    /// crosses solid terrain rather than a temporarily narrow gap).
    fn connectivity_probe_passes(&self, grid: &Grid, start: Cell, goal: Cell) -> bool {
        let mut failures = 0u32;
        for i in 1..=CONNECTIVITY_PROBE_SAMPLES {
            let t = i as f32 / (CONNECTIVITY_PROBE_SAMPLES + 1) as f32;
            let x = start.x as f32 + (goal.x as f32 - start.x as f32) * t;
            let y = start.y as f32 + (goal.y as f32 - start.y as f32) * t;
            let sample = Cell::new(x.round() as u32, y.round() as u32);
            if !self.has_open_neighbor(grid, sample) {
                failures += 1;
            }
        }
        failures * 2 <= CONNECTIVITY_PROBE_SAMPLES
    }

    fn has_open_neighbor(&self, grid: &Grid, cell: Cell) -> bool {
        if !grid.is_blocked(cell) {
            return true;
        }
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = cell.x as i32 + dx;
                let ny = cell.y as i32 + dy;
                if nx < 0 || ny < 0 {
                    continue;
                }
                let neighbor = Cell::new(nx as u32, ny as u32);
                if grid.in_bounds(neighbor) && !grid.is_blocked(neighbor) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tile_source::GridTileSource;

    fn engine() -> SearchEngine {
        SearchEngine {
            params: SearchParams {
                diagonal_movement: true,
                cost_straight: 1.0,
                cost_diagonal: std::f32::consts::SQRT_2,
                max_iterations: 12_000,
            },
            connectivity_probe_threshold_cells: 75,
            hierarchical_threshold_cells: 20,
        }
    }

    fn open_grid(w: u32, h: u32) -> Grid {
        let source = GridTileSource::new_open(w, h, 64.0);
        let mut grid = Grid::new(w, h, 64.0, Vec2::ZERO);
        grid.rebuild_strip(&source, 0, h);
        grid.update_coarse_overlay();
        grid
    }

    #[test]
    fn same_cell_returns_single_waypoint() {
        let grid = open_grid(10, 10);
        let (result, path) = engine().find_path(&grid, Vec2::new(32.0, 32.0), Vec2::new(40.0, 40.0));
        assert_eq!(result, SearchResult::Success);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn line_of_sight_shortcut_returns_two_waypoints() {
        let grid = open_grid(20, 20);
        let (result, path) = engine().find_path(&grid, Vec2::new(48.0, 48.0), Vec2::new(304.0, 304.0));
        assert_eq!(result, SearchResult::Success);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn out_of_bounds_start_is_invalid() {
        let grid = open_grid(10, 10);
        let (result, _) = engine().find_path(&grid, Vec2::new(-1000.0, -1000.0), Vec2::new(100.0, 100.0));
        assert_eq!(result, SearchResult::InvalidStart);
    }
}
