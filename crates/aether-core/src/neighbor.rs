//! The neighbor model: a live view of directly reachable peers
//!
//! Neighbors are supplied and refreshed by the transport layer out-of-band;
//! the DTN core treats them as read-only input. Routers receive a snapshot
//! of the neighbor map per call and never cache it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ids::{Eid, NodeId};

/// A directly reachable peer with link quality and activity information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Transport-level node identifier
    pub id: NodeId,
    /// The endpoint this node answers for
    pub eid: Eid,
    /// Whether the link is currently usable
    pub is_active: bool,
    /// Link quality, 0.0 (unusable) to 1.0 (perfect)
    pub link_quality: f64,
    /// When this neighbor was last heard from
    pub last_contact: DateTime<Utc>,
    /// One-way latency estimate
    pub latency: Duration,
    /// Link bandwidth in bytes per second
    pub bandwidth_bps: u64,
    /// Remaining battery, 0–100, supplied by external telemetry
    ///
    /// `None` means no telemetry is available; energy-aware routing treats
    /// unknown energy as eligible.
    pub battery_percent: Option<f64>,
}

impl Neighbor {
    /// Create an active neighbor with a healthy default link
    pub fn new(id: impl Into<NodeId>, eid: impl Into<Eid>) -> Self {
        Self {
            id: id.into(),
            eid: eid.into(),
            is_active: true,
            link_quality: 1.0,
            last_contact: Utc::now(),
            latency: Duration::from_millis(50),
            bandwidth_bps: 10_000_000,
            battery_percent: None,
        }
    }

    /// Set the link quality (clamped into 0..=1)
    pub fn with_link_quality(mut self, quality: f64) -> Self {
        self.link_quality = quality.clamp(0.0, 1.0);
        self
    }

    /// Mark the neighbor inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Set the last-contact timestamp
    pub fn with_last_contact(mut self, at: DateTime<Utc>) -> Self {
        self.last_contact = at;
        self
    }

    /// Set the latency estimate
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set the bandwidth estimate
    pub fn with_bandwidth(mut self, bps: u64) -> Self {
        self.bandwidth_bps = bps;
        self
    }

    /// Attach battery telemetry
    pub fn with_battery(mut self, percent: f64) -> Self {
        self.battery_percent = Some(percent.clamp(0.0, 100.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let n = Neighbor::new("sat-1", "dtn://mars/sat-1");
        assert!(n.is_active);
        assert_eq!(n.link_quality, 1.0);
        assert!(n.battery_percent.is_none());
    }

    #[test]
    fn link_quality_is_clamped() {
        let n = Neighbor::new("sat-1", "dtn://mars/sat-1").with_link_quality(1.7);
        assert_eq!(n.link_quality, 1.0);
        let n = Neighbor::new("sat-1", "dtn://mars/sat-1").with_link_quality(-0.3);
        assert_eq!(n.link_quality, 0.0);
    }
}
