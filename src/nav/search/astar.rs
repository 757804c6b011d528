//! The core A* expansion: thread-local scratch buffers, octile heuristic,
//! region-of-interest clipping and a dynamic iteration cap.
//!
//! The overall shape (binary-heap open set, flat g-score array, parent
//! backtrace) follows the teacher's `find_path_astar_local_points`
//! (`src/game/pathfinding/astar.rs`); the differences are the octile
//! heuristic (see `heuristic.rs`), a bitset closed set and pooled arrays
//! instead of `BTreeMap`s reallocated per call, and explicit ROI clipping.

use super::heuristic::octile;
use super::params::SearchParams;
use super::pool::{with_search_pool, OpenNode};
use crate::nav::grid::Grid;
use crate::nav::types::{Cell, CellRect, SearchResult};

const NEIGHBORS_8: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];
const NEIGHBORS_4: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

fn cell_index(grid: &Grid, cell: Cell) -> usize {
    (cell.y as usize) * (grid.width as usize) + (cell.x as usize)
}

fn cell_from_index(grid: &Grid, index: usize) -> Cell {
    let width = grid.width as usize;
    Cell::new((index % width) as u32, (index / width) as u32)
}

/// Run A* from `start` to `goal` over `grid`, restricted to `roi`.
/// Returns the cell path (inclusive of both endpoints) on success.
pub fn find_path_cells(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    params: SearchParams,
    roi: CellRect,
) -> (SearchResult, Vec<Cell>) {
    let cell_count = (grid.width as usize) * (grid.height as usize);
    let chebyshev = start.chebyshev_distance(goal);
    let iteration_cap = params.iteration_cap(chebyshev);
    let open_set_cap = params.open_set_cap(chebyshev);

    with_search_pool(cell_count, |pool| {
        let start_idx = cell_index(grid, start);
        let goal_idx = cell_index(grid, goal);

        pool.g_score[start_idx] = 0.0;
        let h0 = octile(start, goal, params.cost_straight, params.cost_diagonal, params.diagonal_movement);
        pool.open.push(OpenNode {
            f: h0,
            cell_index: start_idx as u32,
        });

        let neighbors: &[(i32, i32)] = if params.diagonal_movement {
            &NEIGHBORS_8
        } else {
            &NEIGHBORS_4
        };

        let mut iterations = 0u32;
        while let Some(current) = pool.open.pop() {
            let current_idx = current.cell_index as usize;
            if pool.closed[current_idx] {
                continue;
            }
            if current_idx == goal_idx {
                let path = reconstruct(grid, pool, start_idx, goal_idx);
                return (SearchResult::Success, path);
            }

            pool.closed.set(current_idx, true);
            iterations += 1;
            if iterations > iteration_cap {
                return (SearchResult::Timeout, Vec::new());
            }
            if pool.open.len() > open_set_cap {
                return (SearchResult::Timeout, Vec::new());
            }

            let current_cell = cell_from_index(grid, current_idx);
            for &(dx, dy) in neighbors {
                let nx = current_cell.x as i32 + dx;
                let ny = current_cell.y as i32 + dy;
                if nx < 0 || ny < 0 {
                    continue;
                }
                let neighbor = Cell::new(nx as u32, ny as u32);
                if !grid.in_bounds(neighbor) || !roi.contains(neighbor) {
                    continue;
                }
                if grid.is_blocked(neighbor) {
                    continue;
                }
                let is_diagonal = dx != 0 && dy != 0;
                if is_diagonal {
                    // Corner-cutting prevention: both orthogonal neighbors
                    // of the move must also be walkable.
                    let ortho_a = Cell::new(current_cell.x, neighbor.y);
                    let ortho_b = Cell::new(neighbor.x, current_cell.y);
                    if grid.is_blocked(ortho_a) || grid.is_blocked(ortho_b) {
                        continue;
                    }
                }

                let step_cost = if is_diagonal { params.cost_diagonal } else { params.cost_straight };
                let edge_cost = step_cost * grid.weight(neighbor);
                let neighbor_idx = cell_index(grid, neighbor);
                let tentative_g = pool.g_score[current_idx] + edge_cost;
                if tentative_g < pool.g_score[neighbor_idx] {
                    pool.g_score[neighbor_idx] = tentative_g;
                    pool.parent[neighbor_idx] = current_idx as i64;
                    let h = octile(neighbor, goal, params.cost_straight, params.cost_diagonal, params.diagonal_movement);
                    pool.open.push(OpenNode {
                        f: tentative_g + h,
                        cell_index: neighbor_idx as u32,
                    });
                }
            }
        }

        (SearchResult::NoPathFound, Vec::new())
    })
}

fn reconstruct(grid: &Grid, pool: &mut super::pool::SearchPool, start_idx: usize, goal_idx: usize) -> Vec<Cell> {
    pool.path_buffer.clear();
    let mut current = goal_idx;
    loop {
        pool.path_buffer.push(cell_from_index(grid, current));
        if current == start_idx {
            break;
        }
        let parent = pool.parent[current];
        debug_assert!(parent >= 0, "A* parent chain broken before reaching start");
        current = parent as usize;
    }
    pool.path_buffer.reverse();
    pool.path_buffer.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tile_source::{GridTileSource, TileKind};
    use crate::nav::types::Vec2;

    fn grid_from(source: &GridTileSource, w: u32, h: u32) -> Grid {
        let mut grid = Grid::new(w, h, 64.0, Vec2::ZERO);
        grid.rebuild_strip(source, 0, h);
        grid
    }

    fn default_params() -> SearchParams {
        SearchParams {
            diagonal_movement: true,
            cost_straight: 1.0,
            cost_diagonal: std::f32::consts::SQRT_2,
            max_iterations: 12_000,
        }
    }

    #[test]
    fn finds_direct_path_on_open_grid() {
        let source = GridTileSource::new_open(10, 10, 64.0);
        let grid = grid_from(&source, 10, 10);
        let start = Cell::new(0, 0);
        let goal = Cell::new(9, 9);
        let roi = CellRect::around(start, goal, 20, grid.width, grid.height);
        let (result, path) = find_path_cells(&grid, start, goal, default_params(), roi);
        assert_eq!(result, SearchResult::Success);
        assert_eq!(*path.first().unwrap(), start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn detours_around_wall() {
        let mut source = GridTileSource::new_open(20, 20, 64.0);
        source.set_rect(10, 5, 10, 15, TileKind::Blocked);
        let grid = grid_from(&source, 20, 20);
        let start = Cell::new(1, 10);
        let goal = Cell::new(18, 10);
        let roi = CellRect::around(start, goal, 20, grid.width, grid.height);
        let (result, path) = find_path_cells(&grid, start, goal, default_params(), roi);
        assert_eq!(result, SearchResult::Success);
        assert!(path.iter().all(|c| !(c.x == 10 && (5..=15).contains(&c.y))));
        assert!(path.iter().any(|c| c.y < 5 || c.y > 15));
    }

    #[test]
    fn no_path_when_fully_enclosed() {
        let mut source = GridTileSource::new_open(10, 10, 64.0);
        source.set_rect(0, 4, 9, 4, TileKind::Blocked);
        source.set_tile(4, 4, TileKind::Open);
        // Leave a gap so the goal side is reachable from somewhere, but
        // block the gap too to make the start side unreachable.
        source.set_tile(4, 4, TileKind::Blocked);
        let grid = grid_from(&source, 10, 10);
        let start = Cell::new(1, 1);
        let goal = Cell::new(1, 8);
        let roi = CellRect::around(start, goal, 20, grid.width, grid.height);
        let (result, _path) = find_path_cells(&grid, start, goal, default_params(), roi);
        assert_eq!(result, SearchResult::NoPathFound);
    }

    #[test]
    fn timeout_on_tiny_iteration_cap() {
        let source = GridTileSource::new_open(100, 100, 64.0);
        let grid = grid_from(&source, 100, 100);
        let tight_params = SearchParams {
            max_iterations: 5,
            ..default_params()
        };
        let start = Cell::new(0, 0);
        let goal = Cell::new(99, 99);
        let roi = CellRect::around(start, goal, 100, grid.width, grid.height);
        let (result, _path) = find_path_cells(&grid, start, goal, tight_params, roi);
        assert_eq!(result, SearchResult::Timeout);
    }
}
