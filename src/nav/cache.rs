//! The dispatcher's path cache: a stable 64-bit key derived from quantized
//! raw endpoints, an LRU-evicted store behind a reader-writer lock, and
//! the two-stage endpoint transform (cache-key quantization vs. search
//! endpoint normalization) the dispatcher applies before every lookup.

use crate::nav::grid::Grid;
use crate::nav::types::Vec2;
use rustc_hash::FxHashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A cached path plus its LRU bookkeeping.
#[derive(Debug, Clone)]
pub struct PathCacheEntry {
    pub path: Vec<Vec2>,
    pub last_used: Instant,
    pub use_count: u32,
}

/// Pack four 16-bit quantized lanes into a single stable key.
fn pack_key(sx: u16, sy: u16, gx: u16, gy: u16) -> u64 {
    (sx as u64) | (sy as u64) << 16 | (gx as u64) << 32 | (gy as u64) << 48
}

fn quantize(value: f32, step: f32) -> u16 {
    if step <= 0.0 {
        return value.round().clamp(0.0, u16::MAX as f32) as u16;
    }
    ((value / step).round()).clamp(0.0, u16::MAX as f32) as u16
}

/// Clamp `pos` into the world rectangle shrunk by `margin` on every side.
fn clamp_to_margin(pos: Vec2, world_min: Vec2, world_max: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(world_min.x + margin, (world_max.x - margin).max(world_min.x + margin)),
        pos.y.clamp(world_min.y + margin, (world_max.y - margin).max(world_min.y + margin)),
    )
}

/// Coarse cache key computed from *raw* endpoints — stable across nearby
/// requests so pre-warmed sector-to-sector paths are actually hit by real
/// agent queries.
pub fn cache_key(
    start: Vec2,
    goal: Vec2,
    world_min: Vec2,
    world_max: Vec2,
    edge_margin: f32,
    quantization: f32,
) -> u64 {
    let start = clamp_to_margin(start, world_min, world_max, edge_margin);
    let goal = clamp_to_margin(goal, world_min, world_max, edge_margin);
    pack_key(
        quantize(start.x, quantization),
        quantize(start.y, quantization),
        quantize(goal.x, quantization),
        quantize(goal.y, quantization),
    )
}

/// Finer normalization applied to the endpoints actually handed to the
/// search engine: clamp, snap to the nearest walkable cell, quantize,
/// re-clamp to absorb quantization overshoot. Idempotent after one pass.
pub fn normalize_endpoints(
    grid: &Grid,
    start: Vec2,
    goal: Vec2,
    world_min: Vec2,
    world_max: Vec2,
    edge_margin: f32,
    quantization: f32,
) -> (Vec2, Vec2) {
    let normalize_one = |pos: Vec2| -> Vec2 {
        let clamped = clamp_to_margin(pos, world_min, world_max, edge_margin);
        // Endpoint normalization snaps within 2 cells, per the
        // specification's `radius = 2 * cellSize` rule expressed in cell units.
        let snapped = grid.snap_to_nearest_open(clamped, 2).unwrap_or(clamped);
        let quantized = Vec2::new(
            (snapped.x / quantization).round() * quantization,
            (snapped.y / quantization).round() * quantization,
        );
        clamp_to_margin(quantized, world_min, world_max, edge_margin)
    };
    (normalize_one(start), normalize_one(goal))
}

/// Reader-writer-locked LRU path cache owned exclusively by the dispatcher.
pub struct PathCache {
    capacity: usize,
    entries: RwLock<FxHashMap<u64, PathCacheEntry>>,
    /// Idle-time expiration set via `setCacheExpirationTime`-style control;
    /// `None` (the default) means entries never expire on their own and are
    /// only ever evicted by LRU pressure or explicit invalidation.
    ttl: RwLock<Option<Duration>>,
}

impl PathCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(FxHashMap::default()),
            ttl: RwLock::new(None),
        }
    }

    /// Entries untouched for longer than `ttl` are treated as expired the
    /// next time they're looked up.
    pub fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write().unwrap() = Some(ttl);
    }

    pub fn get(&self, key: u64) -> Option<Vec<Vec2>> {
        let ttl = *self.ttl.read().unwrap();
        let mut entries = self.entries.write().unwrap();
        if let Some(ttl) = ttl {
            if entries.get(&key).is_some_and(|e| e.last_used.elapsed() > ttl) {
                entries.remove(&key);
                return None;
            }
        }
        let entry = entries.get_mut(&key)?;
        entry.last_used = Instant::now();
        entry.use_count += 1;
        Some(entry.path.clone())
    }

    pub fn insert(&self, key: u64, path: Vec<Vec2>) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(&oldest_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k)
            {
                entries.remove(&oldest_key);
            }
        }
        entries.insert(
            key,
            PathCacheEntry {
                path,
                last_used: Instant::now(),
                use_count: 0,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Evict the oldest `fraction` of entries by `last_used`, used after a
    /// full grid rebuild to shed paths the new grid might invalidate
    /// without discarding the whole cache.
    pub fn evict_fraction(&self, fraction: f32) {
        let mut entries = self.entries.write().unwrap();
        let evict_count = ((entries.len() as f32) * fraction).ceil() as usize;
        if evict_count == 0 {
            return;
        }
        let mut by_age: Vec<(u64, Instant)> = entries.iter().map(|(&k, e)| (k, e.last_used)).collect();
        by_age.sort_by_key(|&(_, last_used)| last_used);
        for (key, _) in by_age.into_iter().take(evict_count) {
            entries.remove(&key);
        }
    }

    /// Remove every cached entry whose path has a waypoint within `radius`
    /// of `center` (collision/tile invalidation).
    pub fn evict_near(&self, center: Vec2, radius: f32) {
        let mut entries = self.entries.write().unwrap();
        entries.retain(|_, entry| !entry.path.iter().any(|wp| wp.distance(center) <= radius));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_for_nearby_endpoints() {
        let min = Vec2::ZERO;
        let max = Vec2::new(1280.0, 1280.0);
        let k1 = cache_key(Vec2::new(100.0, 100.0), Vec2::new(900.0, 900.0), min, max, 96.0, 64.0);
        let k2 = cache_key(Vec2::new(110.0, 95.0), Vec2::new(905.0, 910.0), min, max, 96.0, 64.0);
        assert_eq!(k1, k2);
    }

    #[test]
    fn ttl_expires_idle_entries() {
        let cache = PathCache::new(16);
        cache.set_ttl(std::time::Duration::from_millis(1));
        cache.insert(1, vec![Vec2::ZERO]);
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn lru_eviction_respects_capacity() {
        let cache = PathCache::new(2);
        cache.insert(1, vec![Vec2::ZERO]);
        cache.insert(2, vec![Vec2::ZERO]);
        cache.get(2);
        cache.insert(3, vec![Vec2::ZERO]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(2).is_some());
    }
}
