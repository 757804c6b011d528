//! Coarse-to-fine hierarchical search: A* over the 4x4 coarse overlay,
//! then a fine A* refinement per coarse segment.
//!
//! Grounded in the shape of the teacher's `find_path_hierarchical`
//! (`src/game/pathfinding/astar.rs`) — coarse routing with a fine-grained
//! fallback — but built over the specification's simple 4x4 block overlay
//! instead of the teacher's portal/cluster graph, since that richer
//! structure (`HierarchicalGraph`, `ConnectedComponents`) solves a larger
//! problem (persistent multi-cluster routing tables) than a one-shot
//! hierarchical query needs.

use super::astar::find_path_cells;
use super::params::SearchParams;
use crate::nav::grid::Grid;
use crate::nav::types::{Cell, CellRect, SearchResult};

const COARSE_ROI_MARGIN: u32 = 8;
const FINE_ROI_MARGIN: u32 = 12;

/// Attempt a hierarchical search; falls back to a direct fine A* if the
/// coarse overlay is absent, the coarse search fails, or any fine segment
/// fails to refine.
pub fn find_path_hierarchical(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    params: SearchParams,
) -> (SearchResult, Vec<Cell>) {
    let Some(coarse) = grid.coarse() else {
        return direct_fallback(grid, start, goal, params);
    };

    let start_world = grid.grid_to_world(start);
    let goal_world = grid.grid_to_world(goal);
    let coarse_start = coarse.world_to_grid(start_world);
    let coarse_goal = coarse.world_to_grid(goal_world);

    if coarse.is_blocked(coarse_start) || coarse.is_blocked(coarse_goal) {
        return direct_fallback(grid, start, goal, params);
    }

    let coarse_roi = CellRect::around(coarse_start, coarse_goal, COARSE_ROI_MARGIN, coarse.width, coarse.height);
    let (coarse_result, coarse_path) = find_path_cells(coarse, coarse_start, coarse_goal, params, coarse_roi);
    if coarse_result != SearchResult::Success {
        return direct_fallback(grid, start, goal, params);
    }

    let mut merged = vec![start];
    let mut previous_fine = start;
    for window in coarse_path.windows(2) {
        let segment_goal_world = coarse.grid_to_world(window[1]);
        let segment_goal_fine = grid.world_to_grid(segment_goal_world);
        let roi = CellRect::around(previous_fine, segment_goal_fine, FINE_ROI_MARGIN, grid.width, grid.height);
        let (segment_result, segment_path) = find_path_cells(grid, previous_fine, segment_goal_fine, params, roi);
        if segment_result != SearchResult::Success {
            return direct_fallback(grid, start, goal, params);
        }
        merged.extend(segment_path.into_iter().skip(1));
        previous_fine = segment_goal_fine;
    }

    if previous_fine != goal {
        let roi = CellRect::around(previous_fine, goal, FINE_ROI_MARGIN, grid.width, grid.height);
        let (final_result, final_path) = find_path_cells(grid, previous_fine, goal, params, roi);
        if final_result != SearchResult::Success {
            return direct_fallback(grid, start, goal, params);
        }
        merged.extend(final_path.into_iter().skip(1));
    }

    (SearchResult::Success, merged)
}

fn direct_fallback(grid: &Grid, start: Cell, goal: Cell, params: SearchParams) -> (SearchResult, Vec<Cell>) {
    let roi = CellRect::around(start, goal, FINE_ROI_MARGIN.max(grid.width.max(grid.height)), grid.width, grid.height);
    find_path_cells(grid, start, goal, params, roi)
}

/// Whether a query is long enough that hierarchical search is worth its
/// coarse-then-fine overhead. Threshold is supplied by the dispatcher's
/// auto-tuned parameters rather than hardcoded here.
pub fn should_use_hierarchical(start: Cell, goal: Cell, threshold_cells: u32) -> bool {
    start.chebyshev_distance(goal) > threshold_cells
}
