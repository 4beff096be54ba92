//! In-memory bundle store
//!
//! Suitable for relay nodes with no persistence requirement, development,
//! and testing. A single reader/writer lock guards the bundle map; eviction
//! and purge hold the write lock for their full scan-and-remove pass so the
//! capacity invariant holds under concurrent inserts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use aether_core::{
    Bundle, BundleFilter, BundleId, BundleStatus, BundleStore, Clock, StorageError, SystemClock,
};

use crate::eviction::select_victim;

/// Default capacity when none (or zero) is configured
const DEFAULT_CAPACITY: usize = 10_000;

/// A bundle plus the metadata the store keeps beside it
///
/// Status lives here, not on the bundle, so status churn never rewrites
/// payload bytes.
#[derive(Debug, Clone)]
pub(crate) struct StoredBundle {
    pub(crate) bundle: Bundle,
    pub(crate) status: BundleStatus,
    pub(crate) stored_at: DateTime<Utc>,
}

/// In-memory implementation of [`BundleStore`]
pub struct InMemoryBundleStore {
    bundles: RwLock<HashMap<BundleId, StoredBundle>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl InMemoryBundleStore {
    /// Create a store bounded to `capacity` entries
    ///
    /// A zero capacity falls back to the default of 10,000 bundles.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Create a store with an injected clock, for deterministic eviction
    /// behavior in tests
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            bundles: RwLock::new(HashMap::new()),
            capacity,
            clock,
        }
    }

    /// Configured maximum entry count
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BundleId, StoredBundle>> {
        self.bundles.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<BundleId, StoredBundle>> {
        self.bundles.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Evict until an insert fits (caller holds the write lock)
    fn make_room(&self, map: &mut HashMap<BundleId, StoredBundle>) {
        let now = self.clock.now_utc();
        while map.len() >= self.capacity {
            let Some(victim) = select_victim(map.iter(), now) else {
                break;
            };
            if let Some(evicted) = map.remove(&victim) {
                if evicted.status.is_terminal() || evicted.bundle.is_expired(now) {
                    debug!(bundle_id = %victim, status = %evicted.status, "Evicted settled bundle");
                } else {
                    warn!(
                        bundle_id = %victim,
                        priority = ?evicted.bundle.priority,
                        "Evicted in-flight bundle under capacity pressure"
                    );
                }
            }
        }
    }

    fn matches(stored: &StoredBundle, filter: &BundleFilter) -> bool {
        if let Some(dest) = &filter.destination
            && stored.bundle.destination != *dest
        {
            return false;
        }
        if let Some(source) = &filter.source
            && stored.bundle.source != *source
        {
            return false;
        }
        if let Some(status) = filter.status
            && stored.status != status
        {
            return false;
        }
        if let Some(min) = filter.min_priority
            && stored.bundle.priority < min
        {
            return false;
        }
        true
    }
}

#[async_trait]
impl BundleStore for InMemoryBundleStore {
    async fn store(&self, bundle: Bundle) -> Result<(), StorageError> {
        bundle.validate()?;

        let mut map = self.write();
        if !map.contains_key(&bundle.id) {
            self.make_room(&mut map);
        }

        trace!(bundle_id = %bundle.id, dest = %bundle.destination, "Storing bundle");
        map.insert(
            bundle.id,
            StoredBundle {
                bundle,
                status: BundleStatus::Pending,
                stored_at: self.clock.now_utc(),
            },
        );
        Ok(())
    }

    async fn retrieve(&self, id: BundleId) -> Result<Bundle, StorageError> {
        self.read()
            .get(&id)
            .map(|stored| stored.bundle.clone())
            .ok_or(StorageError::NotFound(id))
    }

    async fn delete(&self, id: BundleId) -> Result<(), StorageError> {
        match self.write().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(id)),
        }
    }

    async fn list(&self, filter: BundleFilter) -> Result<Vec<Bundle>, StorageError> {
        let map = self.read();
        let mut matching: Vec<&StoredBundle> = map
            .values()
            .filter(|stored| Self::matches(stored, &filter))
            .collect();

        // Highest priority first, then oldest stored first.
        matching.sort_by(|a, b| {
            b.bundle
                .priority
                .cmp(&a.bundle.priority)
                .then(a.stored_at.cmp(&b.stored_at))
        });

        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }

        Ok(matching.into_iter().map(|s| s.bundle.clone()).collect())
    }

    async fn update_status(&self, id: BundleId, status: BundleStatus) -> Result<(), StorageError> {
        let mut map = self.write();
        let stored = map.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        if stored.status.is_terminal() && status != stored.status {
            return Err(StorageError::TerminalStatus {
                from: stored.status,
                to: status,
            });
        }
        trace!(bundle_id = %id, from = %stored.status, to = %status, "Status transition");
        stored.status = status;
        Ok(())
    }

    async fn get_status(&self, id: BundleId) -> Result<BundleStatus, StorageError> {
        self.read()
            .get(&id)
            .map(|stored| stored.status)
            .ok_or(StorageError::NotFound(id))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.read().len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut map = self.write();
        let before = map.len();
        map.retain(|_, stored| !stored.bundle.is_expired(now));
        let purged = before - map.len();
        if purged > 0 {
            debug!(purged, remaining = map.len(), "Purged expired bundles");
        }
        Ok(purged)
    }
}
