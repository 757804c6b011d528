//! Static tunables the embedding application supplies, and the derived
//! values the dispatcher recomputes on every grid rebuild.
//!
//! The split mirrors the teacher's `GameConfig` (`src/game/config.rs`):
//! one struct of caller-owned knobs, loaded once, versus values the game
//! recomputes as the world changes. Unlike `GameConfig` this is plain data
//! with no asset loader behind it — there is no persisted navigation
//! config, so a `.ron` file and `AssetPlugin` round-trip would be
//! undomanted machinery.

use crate::nav::error::NavError;

/// Caller-supplied, load-once configuration.
#[derive(Debug, Clone)]
pub struct NavConfig {
    pub cell_size: f32,
    pub diagonal_movement: bool,
    pub cost_straight: f32,
    pub cost_diagonal: f32,
    pub max_iterations: u32,
    pub cache_capacity: usize,
    /// World-edge margin (world units) applied when clamping endpoints.
    pub edge_margin: f32,
    /// Frames between periodic stats reports.
    pub stats_report_interval: u32,
    /// Upper bound on path requests dispatched per `update` call; excess
    /// requests queue until the next call. `u32::MAX` disables throttling.
    pub max_paths_per_frame: u32,
    /// Idle-time cache expiration, in seconds. `None` disables expiration.
    pub cache_ttl_seconds: Option<f32>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            diagonal_movement: true,
            cost_straight: 1.0,
            cost_diagonal: std::f32::consts::SQRT_2,
            max_iterations: 12_000,
            cache_capacity: 4096,
            edge_margin: 96.0,
            stats_report_interval: 600,
            max_paths_per_frame: u32::MAX,
            cache_ttl_seconds: None,
        }
    }
}

impl NavConfig {
    pub fn validate(&self) -> Result<(), NavError> {
        if self.cell_size <= 0.0 {
            return Err(NavError::InvalidConfig("cell_size must be positive"));
        }
        if self.cost_straight <= 0.0 || self.cost_diagonal <= 0.0 {
            return Err(NavError::InvalidConfig("movement costs must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(NavError::InvalidConfig("max_iterations must be nonzero"));
        }
        if self.cache_capacity == 0 {
            return Err(NavError::InvalidConfig("cache_capacity must be nonzero"));
        }
        if self.max_paths_per_frame == 0 {
            return Err(NavError::InvalidConfig("max_paths_per_frame must be nonzero"));
        }
        Ok(())
    }
}

/// Values the dispatcher derives from world size on every grid rebuild.
/// Kept separate from [`NavConfig`] so caller-supplied configuration is
/// never silently overwritten by auto-tuning.
#[derive(Debug, Clone, Copy)]
pub struct TunedParams {
    /// Fine quantization applied to search endpoints, in world units.
    pub endpoint_quantization: f32,
    /// Coarse quantization applied to cache keys, in world units.
    pub cache_key_quantization: f32,
    /// Chebyshev fine-cell distance above which hierarchical search kicks in.
    pub hierarchical_threshold_cells: u32,
    /// Chebyshev fine-cell distance above which the connectivity probe runs.
    pub connectivity_probe_threshold_cells: u32,
    /// Side length, in sectors, of the pre-warm grid (`N` in `2N(N-1) + 2(N-1)^2`).
    pub prewarm_sectors: u32,
}

impl TunedParams {
    /// Recompute from current world dimensions, following the ratios in
    /// the dispatcher's auto-tuning rules: quantization scales with world
    /// width, the hierarchical/connectivity thresholds scale with world
    /// diagonal/width, and the pre-warm sector count scales with area.
    pub fn recompute(world_width: f32, world_height: f32, cell_size: f32) -> Self {
        let endpoint_quantization = (world_width * 0.005).clamp(128.0, 256.0);
        let prewarm_sectors = if world_width * world_height < 256.0 * 256.0 {
            4
        } else if world_width * world_height < 1024.0 * 1024.0 {
            8
        } else {
            16
        };
        let cache_key_quantization = world_width / (2.0 * prewarm_sectors as f32);
        let diagonal = (world_width * world_width + world_height * world_height).sqrt();
        let hierarchical_threshold_cells = ((diagonal * 0.05) / cell_size).round().max(1.0) as u32;
        let connectivity_probe_threshold_cells = ((world_width * 0.25) / cell_size).round().max(1.0) as u32;

        Self {
            endpoint_quantization,
            cache_key_quantization,
            hierarchical_threshold_cells,
            connectivity_probe_threshold_cells,
            prewarm_sectors,
        }
    }
}
