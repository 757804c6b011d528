//! Bresenham line-of-sight test used both as a search fast path and as the
//! correctness predicate for path smoothing.
//!
//! Grounded directly on the teacher's `has_line_of_sight`
//! (`src/game/pathfinding/astar.rs`): walk the cell grid along the
//! Bresenham line between two points, failing on the first blocked or
//! out-of-bounds cell.

use crate::nav::grid::Grid;
use crate::nav::types::{Cell, Vec2};

pub fn has_line_of_sight(grid: &Grid, from: Vec2, to: Vec2) -> bool {
    let a = grid.world_to_grid(from);
    let b = grid.world_to_grid(to);
    has_line_of_sight_cells(grid, a, b)
}

pub fn has_line_of_sight_cells(grid: &Grid, a: Cell, b: Cell) -> bool {
    let mut x0 = a.x as i64;
    let mut y0 = a.y as i64;
    let x1 = b.x as i64;
    let y1 = b.y as i64;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 < 0 || y0 < 0 {
            return false;
        }
        let cell = Cell::new(x0 as u32, y0 as u32);
        if !grid.in_bounds(cell) || grid.is_blocked(cell) {
            return false;
        }
        if x0 == x1 && y0 == y1 {
            return true;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tile_source::{GridTileSource, TileKind};

    fn open_grid(w: u32, h: u32) -> Grid {
        let source = GridTileSource::new_open(w, h, 64.0);
        let mut grid = Grid::new(w, h, 64.0, Vec2::ZERO);
        grid.rebuild_strip(&source, 0, h);
        grid
    }

    #[test]
    fn sees_through_open_field() {
        let grid = open_grid(10, 10);
        assert!(has_line_of_sight_cells(&grid, Cell::new(0, 0), Cell::new(9, 9)));
    }

    #[test]
    fn blocked_by_wall() {
        let mut source = GridTileSource::new_open(10, 10, 64.0);
        source.set_rect(5, 0, 5, 9, TileKind::Blocked);
        let mut grid = Grid::new(10, 10, 64.0, Vec2::ZERO);
        grid.rebuild_strip(&source, 0, 10);
        assert!(!has_line_of_sight_cells(&grid, Cell::new(0, 5), Cell::new(9, 5)));
    }

    #[test]
    fn self_sight_is_true() {
        let grid = open_grid(4, 4);
        assert!(has_line_of_sight_cells(&grid, Cell::new(1, 1), Cell::new(1, 1)));
    }
}
