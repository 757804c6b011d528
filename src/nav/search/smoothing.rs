//! Line-of-sight path smoothing: collapse a cell-by-cell path down to the
//! waypoints actually needed to describe straight runs.

use super::los::has_line_of_sight;
use crate::nav::grid::Grid;
use crate::nav::types::Vec2;

/// From each anchor, jump to the farthest later waypoint still visible in
/// a straight line, discarding everything in between. Start and goal are
/// always preserved.
pub fn smooth(grid: &Grid, waypoints: &[Vec2]) -> Vec<Vec2> {
    if waypoints.len() <= 2 {
        return waypoints.to_vec();
    }

    let mut smoothed = Vec::with_capacity(waypoints.len());
    let mut anchor = 0usize;
    smoothed.push(waypoints[anchor]);

    while anchor < waypoints.len() - 1 {
        let mut farthest = anchor + 1;
        for candidate in (anchor + 1)..waypoints.len() {
            if has_line_of_sight(grid, waypoints[anchor], waypoints[candidate]) {
                farthest = candidate;
            }
        }
        smoothed.push(waypoints[farthest]);
        anchor = farthest;
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::tile_source::GridTileSource;

    #[test]
    fn collapses_straight_line_to_two_waypoints() {
        let source = GridTileSource::new_open(10, 10, 64.0);
        let mut grid = Grid::new(10, 10, 64.0, Vec2::ZERO);
        grid.rebuild_strip(&source, 0, 10);

        let waypoints: Vec<Vec2> = (0..10).map(|i| Vec2::new(i as f32 * 64.0 + 32.0, 32.0)).collect();
        let smoothed = smooth(&grid, &waypoints);
        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed[0], *waypoints.first().unwrap());
        assert_eq!(smoothed[1], *waypoints.last().unwrap());
    }

    #[test]
    fn preserves_short_paths() {
        let source = GridTileSource::new_open(4, 4, 64.0);
        let mut grid = Grid::new(4, 4, 64.0, Vec2::ZERO);
        grid.rebuild_strip(&source, 0, 4);
        let waypoints = vec![Vec2::new(32.0, 32.0)];
        assert_eq!(smooth(&grid, &waypoints), waypoints);
    }
}
