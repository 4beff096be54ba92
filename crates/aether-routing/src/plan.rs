//! Contact plans: scheduled communication opportunities
//!
//! In an orbital network, contact opportunities are predictable: a satellite
//! pass over a ground station opens a window of known start, end, and
//! quality. The orbital propagator that computes those windows lives outside
//! this crate; its output arrives here as [`PredictedContact`] values and is
//! folded into a [`ContactPlan`] that routers consult when scoring
//! candidates.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aether_core::{Eid, NodeId};

/// A scheduled communication window with a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactWindow {
    /// The node reachable during this window
    pub node: NodeId,
    /// Window open
    pub start: DateTime<Utc>,
    /// Window close
    pub end: DateTime<Utc>,
    /// Expected link bandwidth in bytes per second
    pub bandwidth_bps: u64,
    /// Expected one-way latency
    pub latency: Duration,
    /// Expected link reliability, 0.0 to 1.0
    pub reliability: f64,
}

impl ContactWindow {
    /// Whether the window is open at `now`
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start && now < self.end
    }
}

/// A contact prediction as supplied by the orbital propagator
///
/// External input: the propagator (out of scope here) computes pass
/// geometry and emits one of these per satellite/ground-station window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedContact {
    /// The node the window applies to
    pub node: NodeId,
    /// That node's endpoint
    pub eid: Eid,
    /// Window open
    pub start: DateTime<Utc>,
    /// Window close
    pub end: DateTime<Utc>,
    /// Predicted link quality over the pass, 0.0 to 1.0
    pub link_quality: f64,
}

/// Upcoming contact windows per node
///
/// Windows are kept sorted by start time per node. The plan is refreshed
/// out-of-band (by the contact-prediction feed) and read by routers during
/// selection; it is safe to share between the feed and the routers.
#[derive(Debug, Default)]
pub struct ContactPlan {
    windows: DashMap<NodeId, Vec<ContactWindow>>,
}

impl ContactPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a window for a node
    ///
    /// A window with the same start time as an existing one replaces it;
    /// otherwise it is inserted in start order.
    pub fn upsert_window(&self, window: ContactWindow) {
        let mut entry = self.windows.entry(window.node.clone()).or_default();
        let windows = entry.value_mut();
        match windows.binary_search_by_key(&window.start, |w| w.start) {
            Ok(pos) => windows[pos] = window,
            Err(pos) => windows.insert(pos, window),
        }
    }

    /// Fold a batch of predictions from the propagator into the plan
    pub fn apply_predictions(&self, predictions: impl IntoIterator<Item = PredictedContact>) {
        let mut applied = 0usize;
        for p in predictions {
            self.upsert_window(ContactWindow {
                node: p.node,
                start: p.start,
                end: p.end,
                // Typical LEO downlink figures until measured.
                bandwidth_bps: 10_000_000,
                latency: Duration::from_millis(50),
                reliability: p.link_quality.clamp(0.0, 1.0),
            });
            applied += 1;
        }
        debug!(applied, "Applied contact predictions to plan");
    }

    /// The first window for `node` that has not closed by `now`
    ///
    /// May be a currently open window or a future one.
    pub fn next_window(&self, node: &NodeId, now: DateTime<Utc>) -> Option<ContactWindow> {
        self.windows
            .get(node)
            .and_then(|ws| ws.iter().find(|w| w.end > now).cloned())
    }

    /// Whether `node` is inside an open window at `now`
    pub fn in_contact(&self, node: &NodeId, now: DateTime<Utc>) -> bool {
        self.windows
            .get(node)
            .map(|ws| ws.iter().any(|w| w.contains(now)))
            .unwrap_or(false)
    }

    /// Drop windows that closed before `now`
    pub fn prune_past(&self, now: DateTime<Utc>) {
        self.windows.retain(|_, ws| {
            ws.retain(|w| w.end > now);
            !ws.is_empty()
        });
    }

    /// Total number of windows across all nodes
    pub fn window_count(&self) -> usize {
        self.windows.iter().map(|e| e.value().len()).sum()
    }
}
