//! Per-workflow serialisation of mutating operations.

use parking_lot::Mutex;
use scrivener_core::WorkflowId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of one async mutex per workflow id.
///
/// Guards are owned so they can be moved into streams; the workflow stays
/// locked until the stream is dropped.
#[derive(Debug, Clone, Default)]
pub struct WorkflowLocks {
    table: Arc<Mutex<HashMap<WorkflowId, Arc<AsyncMutex<()>>>>>,
}

impl WorkflowLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a workflow.
    pub async fn acquire(&self, id: WorkflowId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Exclusive access if nobody holds the workflow right now.
    pub fn try_acquire(&self, id: WorkflowId) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(id).or_default())
        };
        lock.try_lock_owned().ok()
    }

    /// Drop the entry of a deleted workflow.
    pub fn forget(&self, id: WorkflowId) {
        self.table.lock().remove(&id);
    }

    /// Drop the entry for `id` unless a guard or a waiter still uses it.
    pub fn release_idle(&self, id: WorkflowId) {
        let mut table = self.table.lock();
        if table.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            table.remove(&id);
        }
    }

    /// Number of workflow ids with a lock entry.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Whether no workflow has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_blocks_until_dropped() {
        let locks = WorkflowLocks::new();
        let id = WorkflowId::new();
        let guard = locks.acquire(id).await;
        assert!(locks.try_acquire(id).is_none());
        assert!(locks.try_acquire(WorkflowId::new()).is_some());
        drop(guard);
        assert!(locks.try_acquire(id).is_some());
    }

    #[tokio::test]
    async fn idle_entries_are_released_but_held_ones_stay() {
        let locks = WorkflowLocks::new();
        let held = WorkflowId::new();
        let idle = WorkflowId::new();

        let guard = locks.acquire(held).await;
        drop(locks.acquire(idle).await);
        assert_eq!(locks.len(), 2);

        locks.release_idle(held);
        locks.release_idle(idle);
        assert_eq!(locks.len(), 1);

        drop(guard);
        locks.release_idle(held);
        assert!(locks.is_empty());
    }
}
