//! The collision and world-mutation signals the invalidation listener
//! subscribes to, and a minimal in-process bus for wiring them up.

use crate::nav::types::Vec2;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Events the invalidation listener reacts to. Publishers (the collision
/// system, the world/tile system) are external to this crate.
#[derive(Debug, Clone)]
pub enum NavEvent {
    CollisionObstacleChanged {
        position: Vec2,
        radius: f32,
        description: &'static str,
    },
    WorldLoaded {
        width: f32,
        height: f32,
    },
    WorldUnloaded,
    TileChanged {
        tile_x: u32,
        tile_y: u32,
    },
}

/// Opaque handle returned by `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

pub trait EventBus: Send + Sync {
    fn subscribe(&self, handler: Box<dyn Fn(&NavEvent) + Send + Sync>) -> SubscriptionToken;
    fn unsubscribe(&self, token: SubscriptionToken);
    fn publish(&self, event: NavEvent);
}

/// In-process bus dispatching handlers synchronously on `publish`, the way
/// the teacher's event-driven systems (e.g. `MessageReader<PathRequest>` in
/// `src/game/pathfinding/systems.rs`) consume events within the same
/// frame rather than across a queue with deferred delivery.
#[derive(Default)]
pub struct LocalEventBus {
    next_token: AtomicU64,
    handlers: Mutex<FxHashMap<u64, Box<dyn Fn(&NavEvent) + Send + Sync>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventBus for LocalEventBus {
    fn subscribe(&self, handler: Box<dyn Fn(&NavEvent) + Send + Sync>) -> SubscriptionToken {
        let id = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().unwrap().insert(id, handler);
        SubscriptionToken(id)
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.handlers.lock().unwrap().remove(&token.0);
    }

    fn publish(&self, event: NavEvent) {
        let handlers = self.handlers.lock().unwrap();
        for handler in handlers.values() {
            handler(&event);
        }
    }
}
