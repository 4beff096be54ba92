//! # Aether Routing
//!
//! Next-hop selection strategies for the Aether DTN stack.
//!
//! Given a bundle and the current neighbor set, a router picks the neighbor
//! to hand the bundle to, or reports that none exists. Three interchangeable
//! strategies implement the [`Router`](aether_core::Router) contract:
//!
//! - [`StaticRouter`]: a fixed destination → next-hop table, for ground
//!   segments with known topology and for tests
//! - [`ContactGraphRouter`]: direct-match first, then a weighted score over
//!   link quality, latency, bandwidth, and scheduled contact windows;
//!   suited to predictable contact schedules such as satellite orbits
//! - [`EnergyAwareRouter`]: contact-graph selection gated by per-node
//!   battery telemetry, so routing does not exhaust power-constrained relays
//!
//! All strategies are synchronous and side-effect-free with respect to the
//! neighbor map: they read it, never mutate it, and never cache it across
//! calls. Contact windows and energy telemetry are fed in out-of-band
//! ([`ContactPlan`], [`EnergyAwareRouter::update_energy`]).
//!
//! Every strategy reports the same two baseline failures: an empty neighbor
//! map is [`RoutingError::NoNeighbors`] and a map with only inactive
//! neighbors is [`RoutingError::NoActiveNeighbors`]; the errors are
//! distinguishable so the forwarding loop can tell "no contacts at all"
//! from "contacts exist but are down".
//!
//! [`RoutingError::NoNeighbors`]: aether_core::RoutingError::NoNeighbors
//! [`RoutingError::NoActiveNeighbors`]: aether_core::RoutingError::NoActiveNeighbors

pub mod contact_graph;
pub mod energy;
pub mod plan;
pub mod static_routes;

pub use contact_graph::ContactGraphRouter;
pub use energy::EnergyAwareRouter;
pub use plan::{ContactPlan, ContactWindow, PredictedContact};
pub use static_routes::StaticRouter;

use std::collections::HashMap;

use aether_core::{Neighbor, NodeId, RoutingError};

/// Baseline viability guard shared by every strategy
pub(crate) fn check_neighbors(
    neighbors: &HashMap<NodeId, Neighbor>,
) -> Result<(), RoutingError> {
    if neighbors.is_empty() {
        return Err(RoutingError::NoNeighbors);
    }
    if !neighbors.values().any(|n| n.is_active) {
        return Err(RoutingError::NoActiveNeighbors);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::Neighbor;

    #[test]
    fn empty_map_fails_distinctly_from_inactive_map() {
        let empty = HashMap::new();
        assert_eq!(check_neighbors(&empty), Err(RoutingError::NoNeighbors));

        let mut inactive = HashMap::new();
        inactive.insert(
            NodeId::from("sat-1"),
            Neighbor::new("sat-1", "dtn://mars/sat-1").inactive(),
        );
        assert_eq!(
            check_neighbors(&inactive),
            Err(RoutingError::NoActiveNeighbors)
        );
    }

    #[test]
    fn one_active_neighbor_passes() {
        let mut neighbors = HashMap::new();
        neighbors.insert(
            NodeId::from("sat-1"),
            Neighbor::new("sat-1", "dtn://mars/sat-1"),
        );
        assert!(check_neighbors(&neighbors).is_ok());
    }
}
