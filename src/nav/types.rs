//! Shared value types passed between the grid, search engine and dispatcher.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A single waypoint on a computed path.
pub type Waypoint = Vec2;

/// Opaque identifier for an entity owned by the embedding game, independent
/// of any particular ECS. Mirrors the teacher's `EntityIndex` wrapper
/// (`src/game/pathfinding/resources.rs`), which converts a Bevy `Entity`
/// to a dense `u64` so it can index non-ECS collections; here the wrapping
/// goes the other way, letting callers hand in whatever identifier their
/// own entity system uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Monotonic identifier assigned to every request accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Index into a caller-owned slot array that `requestPathToSlot` writes into
/// directly instead of invoking a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub u32);

/// Scheduling tier, mapped 1:1 onto the worker pool's own priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

/// Outcome of a single search. `Success` is the only variant accompanied by
/// a non-empty path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Success,
    NoPathFound,
    InvalidStart,
    InvalidGoal,
    Timeout,
}

impl SearchResult {
    pub fn is_success(self) -> bool {
        matches!(self, SearchResult::Success)
    }
}

/// A single outstanding path request. Constructed by the dispatcher on each
/// public call and consumed by exactly one worker-pool task.
#[derive(Debug, Clone)]
pub struct PathRequest {
    pub id: RequestId,
    pub entity: Option<EntityId>,
    pub start: Vec2,
    pub goal: Vec2,
    pub priority: Priority,
    pub slot: Option<SlotIndex>,
}

/// Grid-space cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn chebyshev_distance(self, other: Cell) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs() as u32;
        let dy = (self.y as i64 - other.y as i64).unsigned_abs() as u32;
        dx.max(dy)
    }
}

/// An inclusive cell-coordinate rectangle used to clip A* expansion to the
/// region around a query's endpoints.
#[derive(Debug, Clone, Copy)]
pub struct CellRect {
    pub min: Cell,
    pub max: Cell,
}

impl CellRect {
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// A rectangle containing both `a` and `b` plus `margin` cells of
    /// padding on every side, clamped to `[0, width) x [0, height)`.
    pub fn around(a: Cell, b: Cell, margin: u32, width: u32, height: u32) -> Self {
        let min_x = a.x.min(b.x).saturating_sub(margin);
        let min_y = a.y.min(b.y).saturating_sub(margin);
        let max_x = (a.x.max(b.x) + margin).min(width.saturating_sub(1));
        let max_y = (a.y.max(b.y) + margin).min(height.saturating_sub(1));
        Self {
            min: Cell::new(min_x, min_y),
            max: Cell::new(max_x, max_y),
        }
    }
}
