//! The worker pool the dispatcher submits search and rebuild tasks to.
//!
//! Grounded in `bevy_tasks::AsyncComputeTaskPool` usage patterns from the
//! pack (see `dzautner-megacity`'s `crates/simulation/src/movement/pathfinding.rs`,
//! which spawns pathfinding work via `AsyncComputeTaskPool::get().spawn`
//! and joins it with `block_on`). The teacher itself reaches for Bevy's
//! task pools the same way elsewhere in its simulation systems; this
//! trait narrows that usage to exactly the operations the dispatcher
//! needs, so the core can be driven by any executor in tests.

use crate::nav::types::Priority;
use bevy_tasks::{Task, TaskPool, TaskPoolBuilder};

/// External collaborator that actually runs submitted work. The
/// dispatcher never spawns an OS thread directly; it only ever goes
/// through this trait.
pub trait WorkerPool: Send + Sync {
    /// Fire-and-forget submission at the given priority. Priority is
    /// advisory for pools that do not implement tiered scheduling (the
    /// reference implementation does not reorder by priority; consult
    /// `label` in logs to see which paths actually contend for workers).
    fn enqueue(&self, priority: Priority, label: &'static str, task: Box<dyn FnOnce() + Send + 'static>);

    /// Submission whose completion the caller waits on (used to
    /// coordinate parallel grid-rebuild strips).
    fn enqueue_with_result(
        &self,
        priority: Priority,
        label: &'static str,
        task: Box<dyn FnOnce() + Send + 'static>,
    ) -> Task<()>;

    /// Suggested worker count for a workload of `item_count` independent
    /// units (e.g. grid rows to rebuild).
    fn optimal_workers(&self, item_count: usize) -> usize;

    /// Suggested `(batch_count, batch_size)` split of `item_count` items
    /// across `worker_count` workers.
    fn batch_strategy(&self, item_count: usize, worker_count: usize) -> (usize, usize) {
        let worker_count = worker_count.max(1);
        let batch_count = worker_count.min(item_count.max(1));
        let batch_size = item_count.div_ceil(batch_count.max(1));
        (batch_count, batch_size)
    }
}

/// Reference [`WorkerPool`] backed by `bevy_tasks::TaskPool`. Priority is
/// not currently honored by `TaskPool` itself (it has one FIFO queue per
/// pool); callers that need strict tiering should back `Critical`/`High`
/// work with a separate pool instance.
pub struct BevyTaskPool {
    pool: TaskPool,
}

impl BevyTaskPool {
    pub fn new(thread_count: usize) -> Self {
        Self {
            pool: TaskPoolBuilder::new().num_threads(thread_count.max(1)).build(),
        }
    }
}

impl Default for BevyTaskPool {
    fn default() -> Self {
        Self::new(num_cpus_fallback())
    }
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl WorkerPool for BevyTaskPool {
    fn enqueue(&self, _priority: Priority, _label: &'static str, task: Box<dyn FnOnce() + Send + 'static>) {
        self.pool.spawn(async move { task() }).detach();
    }

    fn enqueue_with_result(
        &self,
        _priority: Priority,
        _label: &'static str,
        task: Box<dyn FnOnce() + Send + 'static>,
    ) -> Task<()> {
        self.pool.spawn(async move { task() })
    }

    fn optimal_workers(&self, item_count: usize) -> usize {
        self.pool.thread_num().min(item_count.max(1))
    }
}

/// Runs everything inline on the calling thread. Used by unit tests and
/// `findPathImmediate`-style synchronous call sites where spinning up a
/// real pool would only add latency.
#[derive(Default)]
pub struct InlineWorkerPool;

fn inline_task_pool() -> &'static TaskPool {
    static POOL: std::sync::OnceLock<TaskPool> = std::sync::OnceLock::new();
    POOL.get_or_init(|| TaskPoolBuilder::new().num_threads(1).build())
}

impl WorkerPool for InlineWorkerPool {
    fn enqueue(&self, _priority: Priority, _label: &'static str, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }

    fn enqueue_with_result(
        &self,
        _priority: Priority,
        _label: &'static str,
        task: Box<dyn FnOnce() + Send + 'static>,
    ) -> Task<()> {
        task();
        inline_task_pool().spawn(async {})
    }

    fn optimal_workers(&self, _item_count: usize) -> usize {
        1
    }
}
