//! Node performance counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal atomic counters, updated by the workers
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) bundles_received: AtomicU64,
    pub(crate) bundles_sent: AtomicU64,
    pub(crate) bundles_dropped: AtomicU64,
    pub(crate) bundles_expired: AtomicU64,
    pub(crate) bundles_failed: AtomicU64,
    pub(crate) delivered_local: AtomicU64,
    pub(crate) bytes_received: AtomicU64,
    pub(crate) bytes_sent: AtomicU64,
}

impl Counters {
    pub(crate) fn snapshot(&self, active_neighbors: usize) -> NodeMetrics {
        NodeMetrics {
            bundles_received: self.bundles_received.load(Ordering::Relaxed),
            bundles_sent: self.bundles_sent.load(Ordering::Relaxed),
            bundles_dropped: self.bundles_dropped.load(Ordering::Relaxed),
            bundles_expired: self.bundles_expired.load(Ordering::Relaxed),
            bundles_failed: self.bundles_failed.load(Ordering::Relaxed),
            delivered_local: self.delivered_local.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            active_neighbors,
        }
    }

    pub(crate) fn add(&self, counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of a node's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeMetrics {
    /// Bundles accepted through ingress
    pub bundles_received: u64,
    /// Confirmed hand-offs to a next hop
    pub bundles_sent: u64,
    /// Bundles rejected (invalid, queue full)
    pub bundles_dropped: u64,
    /// Bundles that hit their lifetime
    pub bundles_expired: u64,
    /// Bundles whose retry budget was exhausted
    pub bundles_failed: u64,
    /// Bundles delivered to this node's own endpoint
    pub delivered_local: u64,
    /// Payload bytes accepted through ingress
    pub bytes_received: u64,
    /// Payload bytes in confirmed hand-offs
    pub bytes_sent: u64,
    /// Neighbors marked active at snapshot time
    pub active_neighbors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let counters = Counters::default();
        counters.add(&counters.bundles_received, 3);
        counters.add(&counters.bytes_received, 1024);

        let snapshot = counters.snapshot(2);
        assert_eq!(snapshot.bundles_received, 3);
        assert_eq!(snapshot.bytes_received, 1024);
        assert_eq!(snapshot.active_neighbors, 2);
        assert_eq!(snapshot.bundles_sent, 0);
    }
}
