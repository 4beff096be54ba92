//! Configuration for a DTN node

use std::time::Duration;

/// Configuration for a [`Node`](crate::Node)
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Ingress/egress channel capacity
    pub channel_capacity: usize,
    /// Consecutive failed hand-offs before a bundle is marked failed
    pub max_retries: u32,
    /// How often the maintenance worker purges expired bundles
    pub purge_interval: Duration,
    /// How often pending bundles are re-queued for forwarding
    pub retry_interval: Duration,
    /// A neighbor with no contact for this long is marked inactive
    pub neighbor_stale_after: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
            max_retries: 3,
            purge_interval: Duration::from_secs(5 * 60),
            retry_interval: Duration::from_secs(30),
            neighbor_stale_after: Duration::from_secs(10 * 60),
        }
    }
}

impl NodeConfig {
    /// Set the channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the hand-off retry budget
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the purge sweep interval
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    /// Set the pending-bundle retry interval
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the neighbor staleness threshold
    pub fn with_neighbor_stale_after(mut self, after: Duration) -> Self {
        self.neighbor_stale_after = after;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = NodeConfig::default()
            .with_channel_capacity(16)
            .with_max_retries(5)
            .with_retry_interval(Duration::from_millis(100));
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_interval, Duration::from_millis(100));
        // Untouched fields keep their defaults.
        assert_eq!(config.purge_interval, Duration::from_secs(300));
    }
}
