//! Contact graph routing
//!
//! Suited to networks with predictable contact schedules (satellite orbits,
//! ground-station passes). If an active neighbor *is* the destination, it
//! wins outright; otherwise candidates are scored on link quality, latency,
//! bandwidth, bundle priority, and whether the contact plan shows a current
//! or imminent window for them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::trace;

use aether_core::{
    Bundle, Clock, Neighbor, NodeId, Priority, Router, RoutingError, SystemClock,
};

use crate::check_neighbors;
use crate::plan::{ContactPlan, ContactWindow};

/// Scoring weights. Link quality dominates; the plan bonus can outweigh it
/// when a window is actually open.
const WEIGHT_LINK_QUALITY: f64 = 0.4;
const WEIGHT_LATENCY: f64 = 0.3;
const WEIGHT_BANDWIDTH: f64 = 0.2;
const WEIGHT_PRIORITY: f64 = 0.1;
const BONUS_IN_CONTACT: f64 = 0.5;
const BONUS_UPCOMING: f64 = 0.25;

/// Latency above this contributes nothing to the score
const LATENCY_CEILING_MS: f64 = 10_000.0;
/// Bandwidth at or above this scores full marks
const BANDWIDTH_CEILING_BPS: f64 = 1_000_000.0;

/// How far ahead an upcoming window still earns the scheduling bonus
const UPCOMING_HORIZON: Duration = Duration::from_secs(15 * 60);

/// Router that scores candidates against a contact plan
pub struct ContactGraphRouter {
    plan: Arc<ContactPlan>,
    clock: Arc<dyn Clock>,
}

impl ContactGraphRouter {
    /// Create a router with an empty contact plan
    pub fn new() -> Self {
        Self::with_plan(Arc::new(ContactPlan::new()))
    }

    /// Create a router over a shared contact plan
    ///
    /// The plan may be refreshed concurrently by the contact-prediction
    /// feed.
    pub fn with_plan(plan: Arc<ContactPlan>) -> Self {
        Self {
            plan,
            clock: Arc::new(SystemClock),
        }
    }

    /// Inject a clock, for deterministic window scoring in tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The contact plan this router consults
    pub fn plan(&self) -> &Arc<ContactPlan> {
        &self.plan
    }

    /// Record a contact window for a node
    pub fn update_contact(&self, window: ContactWindow) {
        self.plan.upsert_window(window);
    }

    fn score(&self, neighbor: &Neighbor, priority: Priority, now: DateTime<Utc>) -> f64 {
        let mut score = neighbor.link_quality * WEIGHT_LINK_QUALITY;

        let latency_factor =
            1.0 - (neighbor.latency.as_millis() as f64 / LATENCY_CEILING_MS).min(1.0);
        score += latency_factor * WEIGHT_LATENCY;

        let bandwidth_factor =
            (neighbor.bandwidth_bps as f64 / BANDWIDTH_CEILING_BPS).min(1.0);
        score += bandwidth_factor * WEIGHT_BANDWIDTH;

        score += f64::from(u8::from(priority)) / 2.0 * WEIGHT_PRIORITY;

        if self.plan.in_contact(&neighbor.id, now) {
            score += BONUS_IN_CONTACT;
        } else if let Some(window) = self.plan.next_window(&neighbor.id, now)
            && (window.start - now).to_std().unwrap_or(Duration::ZERO) <= UPCOMING_HORIZON
        {
            score += BONUS_UPCOMING;
        }

        score
    }
}

impl Default for ContactGraphRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for ContactGraphRouter {
    fn select_next_hop(
        &self,
        bundle: &Bundle,
        neighbors: &HashMap<NodeId, Neighbor>,
    ) -> Result<NodeId, RoutingError> {
        check_neighbors(neighbors)?;
        let now = self.clock.now_utc();

        let active = || neighbors.values().filter(|n| n.is_active);

        // An active neighbor that is the destination wins regardless of
        // anyone's score.
        if let Some(direct) = active()
            .filter(|n| n.eid == bundle.destination)
            .max_by(|a, b| {
                a.link_quality
                    .total_cmp(&b.link_quality)
                    .then(a.last_contact.cmp(&b.last_contact))
                    .then(b.id.cmp(&a.id))
            })
        {
            trace!(bundle_id = %bundle.id, next_hop = %direct.id, "Destination is a direct neighbor");
            return Ok(direct.id.clone());
        }

        // Tie-break is deterministic: score, then link quality, then most
        // recent contact, then node ID. No HashMap iteration order leaks
        // into the decision.
        let best = active()
            .map(|n| (self.score(n, bundle.priority, now), n))
            .max_by(|(sa, a), (sb, b)| {
                sa.total_cmp(sb)
                    .then(a.link_quality.total_cmp(&b.link_quality))
                    .then(a.last_contact.cmp(&b.last_contact))
                    .then(b.id.cmp(&a.id))
            });

        match best {
            Some((score, neighbor)) => {
                trace!(
                    bundle_id = %bundle.id,
                    next_hop = %neighbor.id,
                    score,
                    "Contact graph selection"
                );
                Ok(neighbor.id.clone())
            }
            None => Err(RoutingError::NoRoute {
                destination: bundle.destination.to_string(),
            }),
        }
    }
}
