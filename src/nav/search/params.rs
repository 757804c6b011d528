//! Algorithm parameters, passed explicitly rather than read from shared
//! mutable state — the "avoid dynamic dispatch over algorithm parameters"
//! pattern: a worker thread running `astar` never needs to synchronize
//! with whatever the dispatcher's configuration currently says, because
//! the caller copies out a `SearchParams` before submitting the task.

#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub diagonal_movement: bool,
    pub cost_straight: f32,
    pub cost_diagonal: f32,
    pub max_iterations: u32,
}

impl SearchParams {
    /// Dynamic iteration cap for a query spanning `chebyshev_distance`
    /// fine cells: short queries get a tight cap so failures surface fast,
    /// long queries get headroom up to the configured ceiling.
    pub fn iteration_cap(&self, chebyshev_distance: u32) -> u32 {
        let base = match chebyshev_distance {
            0..=32 => 1_000,
            33..=96 => 2_500,
            _ => 5_000,
        };
        base.min(self.max_iterations)
    }

    /// Open-set size beyond which a search is aborted early regardless of
    /// the iteration cap, tied to the same distance tiers.
    pub fn open_set_cap(&self, chebyshev_distance: u32) -> usize {
        self.iteration_cap(chebyshev_distance) as usize
    }
}
