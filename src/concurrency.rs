//! Per-identity flight locks
//!
//! Expensive per-entry work (thumbnail extraction) is coalesced by taking the
//! lock for the entry's identity first. Unrelated identities never contend.
//! Lock slots are pruned once nobody holds or awaits them, and a guard dropped
//! by a cancelled task releases its slot like any other drop.

use crate::types::EntryId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutexes, one per in-flight identity.
#[derive(Debug, Default)]
pub struct FlightLocks {
    locks: DashMap<EntryId, Arc<Mutex<()>>>,
}

impl FlightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `id`, then hold it until the guard drops.
    pub async fn acquire(&self, id: &EntryId) -> FlightGuard<'_> {
        let lock = self.slot(id);
        let guard = lock.lock_owned().await;
        FlightGuard {
            locks: self,
            key: id.clone(),
            guard: Some(guard),
        }
    }

    fn slot(&self, id: &EntryId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(id) {
            return Arc::clone(lock.value());
        }
        Arc::clone(
            self.locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Number of identities currently held or awaited
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Holds one identity's flight lock.
pub struct FlightGuard<'a> {
    locks: &'a FlightLocks,
    key: EntryId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own reference left means no holder and no waiter.
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
