//! The authoritative world representation the grid rebuilds from.
//!
//! Grounded in the teacher's `FlowField::world_to_grid`/tile-cost
//! conventions (`src/game/structures/flow_field.rs`), generalized into a
//! trait so the navigation core never depends on the embedding engine's
//! concrete tilemap type.

use crate::nav::types::Vec2;

/// External collaborator supplying the authoritative tile layout. The
/// embedding engine's real tilemap implements this; the crate ships
/// [`GridTileSource`] as an in-memory reference implementation for tests
/// and the demo binary.
pub trait TileSource: Send + Sync {
    fn has_active_world(&self) -> bool;

    /// World-space `(width, height)`, or `None` if no world is loaded.
    fn world_dimensions(&self) -> Option<(f32, f32)>;

    /// World-space `(min_x, min_y, max_x, max_y)`.
    fn world_bounds(&self) -> Option<(f32, f32, f32, f32)> {
        self.world_dimensions().map(|(w, h)| (0.0, 0.0, w, h))
    }

    /// Whether the tile under `world_pos` is passable.
    fn is_walkable(&self, world_pos: Vec2) -> bool;

    /// Movement cost multiplier for the tile under `world_pos` (>= 1.0).
    fn weight_at(&self, world_pos: Vec2) -> f32;

    /// World units per tile in the source's own tile grid (may differ from
    /// the navigation grid's `cell_size`).
    fn tile_world_size(&self) -> f32;
}

/// A single tile kind in [`GridTileSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileKind {
    Open,
    Water,
    Blocked,
}

impl TileKind {
    fn is_walkable(self) -> bool {
        !matches!(self, TileKind::Blocked)
    }

    fn weight(self) -> f32 {
        match self {
            TileKind::Open => 1.0,
            TileKind::Water => 2.0,
            TileKind::Blocked => 1.0,
        }
    }
}

/// In-memory reference [`TileSource`] backed by a flat `Vec<TileKind>`.
/// Used by tests, the worked examples in the specification, and the demo
/// binary — not intended as production tile storage.
#[derive(Debug, Clone)]
pub struct GridTileSource {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<TileKind>,
}

impl GridTileSource {
    pub fn new_open(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![TileKind::Open; (width * height) as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn set_tile(&mut self, x: u32, y: u32, kind: TileKind) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.tiles[idx] = kind;
        }
    }

    pub fn set_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, kind: TileKind) {
        for y in y0..=y1.min(self.height.saturating_sub(1)) {
            for x in x0..=x1.min(self.width.saturating_sub(1)) {
                self.set_tile(x, y, kind);
            }
        }
    }

    fn world_to_tile(&self, world_pos: Vec2) -> Option<(u32, u32)> {
        let tx = (world_pos.x / self.tile_size).floor();
        let ty = (world_pos.y / self.tile_size).floor();
        if tx < 0.0 || ty < 0.0 {
            return None;
        }
        let (tx, ty) = (tx as u32, ty as u32);
        if tx >= self.width || ty >= self.height {
            return None;
        }
        Some((tx, ty))
    }
}

impl TileSource for GridTileSource {
    fn has_active_world(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn world_dimensions(&self) -> Option<(f32, f32)> {
        if self.has_active_world() {
            Some((
                self.width as f32 * self.tile_size,
                self.height as f32 * self.tile_size,
            ))
        } else {
            None
        }
    }

    fn is_walkable(&self, world_pos: Vec2) -> bool {
        match self.world_to_tile(world_pos) {
            Some((x, y)) => self.tiles[self.index(x, y)].is_walkable(),
            None => false,
        }
    }

    fn weight_at(&self, world_pos: Vec2) -> f32 {
        match self.world_to_tile(world_pos) {
            Some((x, y)) => self.tiles[self.index(x, y)].weight(),
            None => 1.0,
        }
    }

    fn tile_world_size(&self) -> f32 {
        self.tile_size
    }
}
