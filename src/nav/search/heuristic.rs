//! Octile-distance heuristic (admissible for an 8-connected grid with a
//! diagonal cost of `sqrt(2)`). The teacher's own `heuristic()`
//! (`src/game/pathfinding/astar.rs`) is plain Manhattan distance (`dx +
//! dy`), which underestimates less tightly on diagonal-heavy maps; this
//! is the one place the search engine deliberately departs from the
//! teacher's algorithm rather than its style, since the specification
//! calls for octile distance specifically.

use crate::nav::types::Cell;

pub fn octile(a: Cell, b: Cell, cost_straight: f32, cost_diagonal: f32, diagonal_movement: bool) -> f32 {
    let dx = (a.x as i64 - b.x as i64).unsigned_abs() as f32;
    let dy = (a.y as i64 - b.y as i64).unsigned_abs() as f32;
    if diagonal_movement {
        let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
        cost_diagonal * lo + cost_straight * (hi - lo)
    } else {
        cost_straight * (dx + dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admissible_on_diagonal_grid() {
        // True cost from (0,0) to (3,4) with diagonal movement is
        // 3 diagonal steps + 1 straight step.
        let h = octile(Cell::new(0, 0), Cell::new(3, 4), 1.0, std::f32::consts::SQRT_2, true);
        let true_cost = 3.0 * std::f32::consts::SQRT_2 + 1.0;
        assert!(h <= true_cost + 1e-4);
    }

    #[test]
    fn zero_at_goal() {
        let h = octile(Cell::new(5, 5), Cell::new(5, 5), 1.0, std::f32::consts::SQRT_2, true);
        assert_eq!(h, 0.0);
    }

    #[test]
    fn reduces_to_manhattan_without_diagonal() {
        let h = octile(Cell::new(0, 0), Cell::new(2, 3), 1.0, std::f32::consts::SQRT_2, false);
        assert_eq!(h, 5.0);
    }
}
