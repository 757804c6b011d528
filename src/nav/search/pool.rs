//! Per-thread scratch buffers for A*: open-set heap, g-score array, parent
//! array and closed-set bitmap, reused across searches on the same worker
//! thread instead of reallocated per request.
//!
//! The teacher does not use thread-local pools (its A* allocates a fresh
//! `BTreeMap` per call in `find_path_astar_local_points`); this pattern is
//! grounded in the specification's explicit design note to pool
//! allocations per search thread, implemented the idiomatic Rust way via
//! `std::thread_local!` with a `RefCell`-guarded pool, resized only on
//! growth.

use crate::nav::types::Cell;
use fixedbitset::FixedBitSet;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenNode {
    pub f: f32,
    pub cell_index: u32,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest f-score first.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.cell_index.cmp(&self.cell_index))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct SearchPool {
    pub open: BinaryHeap<OpenNode>,
    pub g_score: Vec<f32>,
    pub parent: Vec<i64>,
    pub closed: FixedBitSet,
    pub path_buffer: Vec<Cell>,
    capacity: usize,
}

impl SearchPool {
    fn new() -> Self {
        Self {
            open: BinaryHeap::new(),
            g_score: Vec::new(),
            parent: Vec::new(),
            closed: FixedBitSet::new(),
            path_buffer: Vec::new(),
            capacity: 0,
        }
    }

    /// Reset all buffers for a search over `cell_count` cells, growing
    /// storage only if the grid is larger than anything seen so far on
    /// this thread.
    pub fn reset_for(&mut self, cell_count: usize) {
        self.open.clear();
        self.path_buffer.clear();
        if cell_count > self.capacity {
            self.g_score.resize(cell_count, f32::INFINITY);
            self.parent.resize(cell_count, -1);
            self.closed = FixedBitSet::with_capacity(cell_count);
            self.capacity = cell_count;
        }
        self.g_score[..cell_count].fill(f32::INFINITY);
        self.parent[..cell_count].fill(-1);
        self.closed.clear();
    }
}

thread_local! {
    static SEARCH_POOL: RefCell<SearchPool> = RefCell::new(SearchPool::new());
}

/// Borrow this thread's search pool for the duration of `f`, resized to
/// fit `cell_count` cells.
pub fn with_search_pool<R>(cell_count: usize, f: impl FnOnce(&mut SearchPool) -> R) -> R {
    SEARCH_POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        pool.reset_for(cell_count);
        f(&mut pool)
    })
}
