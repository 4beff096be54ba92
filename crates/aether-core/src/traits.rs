//! Core traits for the Aether DTN stack
//!
//! ## Key Traits
//!
//! - [`BundleStore`]: capacity-bounded persistence for bundles and status
//! - [`Router`]: next-hop selection strategy
//! - [`Transport`]: the convergence layer that physically moves bundles
//! - [`Clock`]: time abstraction for testability

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::bundle::{Bundle, Priority};
use crate::error::{RoutingError, StorageError, TransportError};
use crate::ids::{BundleId, Eid, NodeId};
use crate::neighbor::Neighbor;
use crate::status::BundleStatus;

/// Query criteria for [`BundleStore::list`]
///
/// All fields are optional; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct BundleFilter {
    /// Match bundles headed for this endpoint
    pub destination: Option<Eid>,
    /// Match bundles originating from this endpoint
    pub source: Option<Eid>,
    /// Match bundles in this lifecycle state
    pub status: Option<BundleStatus>,
    /// Match bundles at or above this priority
    pub min_priority: Option<Priority>,
    /// Cap the number of results
    pub limit: Option<usize>,
}

impl BundleFilter {
    /// Filter by destination endpoint
    pub fn by_destination(destination: impl Into<Eid>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Self::default()
        }
    }

    /// Filter by lifecycle status
    pub fn by_status(status: BundleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Restrict to a status
    pub fn with_status(mut self, status: BundleStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict the result count
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Bundle persistence, bounded by a configured maximum entry count
///
/// Implementations hold bundles plus their delivery status, independent of
/// routing. An in-memory store is one implementation; a durable relational
/// store is another. The reference relational representation:
///
/// ```sql
/// dtn_bundles(
///   id TEXT PRIMARY KEY,
///   source_eid TEXT NOT NULL,
///   destination_eid TEXT NOT NULL,
///   payload BYTEA NOT NULL,
///   created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
///   expires_at TIMESTAMPTZ NOT NULL,
///   priority INTEGER NOT NULL DEFAULT 1,
///   hop_count INTEGER NOT NULL DEFAULT 0,
///   status TEXT NOT NULL DEFAULT 'pending'
///     CHECK (status IN ('pending','in_transit','delivered','failed','expired'))
/// )
/// ```
///
/// with indexes on `destination_eid`, `status`, and `expires_at`.
///
/// Capacity pressure is handled by eviction inside [`store`], never by
/// returning an error: the post-insert count must not exceed capacity, and
/// eviction prefers terminal-status entries over pending/in-transit ones.
///
/// [`store`]: BundleStore::store
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Insert or overwrite a bundle by ID
    ///
    /// Re-storing an existing ID overwrites the bundle and resets its status
    /// to [`BundleStatus::Pending`]. If the store is at capacity, an
    /// eviction pass runs as part of the insert.
    async fn store(&self, bundle: Bundle) -> Result<(), StorageError>;

    /// Fetch a bundle by ID
    async fn retrieve(&self, id: BundleId) -> Result<Bundle, StorageError>;

    /// Remove a bundle and its status entry
    ///
    /// Deleting an absent ID fails with [`StorageError::NotFound`].
    async fn delete(&self, id: BundleId) -> Result<(), StorageError>;

    /// Return bundles matching the filter
    async fn list(&self, filter: BundleFilter) -> Result<Vec<Bundle>, StorageError>;

    /// Change a bundle's lifecycle status
    ///
    /// Fails with [`StorageError::TerminalStatus`] on any transition out of
    /// a terminal state.
    async fn update_status(&self, id: BundleId, status: BundleStatus) -> Result<(), StorageError>;

    /// Current lifecycle status of a bundle
    async fn get_status(&self, id: BundleId) -> Result<BundleStatus, StorageError>;

    /// Current entry count
    async fn count(&self) -> Result<usize, StorageError>;

    /// Remove every bundle expired at `now`, regardless of status
    ///
    /// Returns the number of bundles removed. Intended to run periodically
    /// from the forwarding loop's maintenance sweep, not on every access.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError>;
}

/// Next-hop selection strategy
///
/// Implementations are pure and synchronous with respect to their inputs:
/// no blocking I/O, no mutation of the neighbor map, no neighbor state
/// cached across calls. Any telemetry a strategy needs (energy levels,
/// contact predictions) is embedded in the [`Neighbor`] values or injected
/// at construction time.
pub trait Router: Send + Sync {
    /// Select the next hop for a bundle given the current neighbor set
    ///
    /// Fails with [`RoutingError::NoNeighbors`] on an empty map, with
    /// [`RoutingError::NoActiveNeighbors`] when every neighbor is inactive,
    /// and with [`RoutingError::NoRoute`] when no active neighbor can reach
    /// the destination.
    fn select_next_hop(
        &self,
        bundle: &Bundle,
        neighbors: &HashMap<NodeId, Neighbor>,
    ) -> Result<NodeId, RoutingError>;
}

/// The convergence layer that physically moves a bundle between nodes
///
/// Opaque to the DTN core; may be HTTP, pub-sub, or a radio link. The
/// forwarding loop only advances a bundle's provenance after a confirmed
/// hand-off.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempt to hand a bundle to the given next hop
    ///
    /// `Ok(true)` means the hand-off was confirmed by the peer; `Ok(false)`
    /// means the transfer completed without confirmation and must be
    /// retried.
    async fn attempt_handoff(
        &self,
        next_hop: &NodeId,
        bundle: &Bundle,
    ) -> Result<bool, TransportError>;
}

/// Time abstraction for testability
///
/// Lets tests drive expiration and sweep behavior deterministically instead
/// of calling the system clock directly.
pub trait Clock: Send + Sync {
    /// Current UTC datetime
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real clock backed by system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Advance the clock by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::from_std(delta).unwrap_or(chrono::Duration::zero());
    }

    /// Jump the clock to an absolute instant
    pub fn set(&self, at: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = at;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Utc::now());
        let before = clock.now_utc();
        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.now_utc() - before, chrono::Duration::seconds(60));
    }

    #[test]
    fn manual_clock_is_frozen_between_advances() {
        let clock = ManualClock::new(Utc::now());
        assert_eq!(clock.now_utc(), clock.now_utc());
    }

    #[test]
    fn filter_builders() {
        let filter = BundleFilter::by_destination("dtn://earth/gs-nyc")
            .with_status(BundleStatus::Pending)
            .with_limit(10);
        assert_eq!(filter.destination, Some(Eid::from("dtn://earth/gs-nyc")));
        assert_eq!(filter.status, Some(BundleStatus::Pending));
        assert_eq!(filter.limit, Some(10));
    }
}
