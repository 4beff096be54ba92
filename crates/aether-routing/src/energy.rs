//! Energy-aware routing
//!
//! Contact-graph selection gated by battery telemetry: a relay with a
//! depleting battery is excluded even if its link quality is momentarily
//! high, so routing decisions do not exhaust power-constrained nodes.
//! Higher-priority bundles may use lower-energy relays.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::trace;

use aether_core::{Bundle, Neighbor, NodeId, Priority, Router, RoutingError};

use crate::check_neighbors;
use crate::contact_graph::ContactGraphRouter;

/// Minimum battery percentage a relay needs per bundle priority
fn min_battery_for(priority: Priority) -> f64 {
    match priority {
        Priority::Bulk => 30.0,
        Priority::Normal => 20.0,
        Priority::Expedited => 10.0,
    }
}

/// Contact-graph router with per-node energy gating
///
/// Energy levels arrive from external telemetry via
/// [`update_energy`](Self::update_energy); a neighbor's own
/// `battery_percent` field is used when no telemetry entry exists, and a
/// node with unknown energy is assumed eligible. Hand-offs directly to the
/// destination are never energy-gated.
pub struct EnergyAwareRouter {
    inner: ContactGraphRouter,
    energy_levels: DashMap<NodeId, f64>,
}

impl EnergyAwareRouter {
    /// Create an energy-aware router over a fresh contact-graph router
    pub fn new() -> Self {
        Self::with_inner(ContactGraphRouter::new())
    }

    /// Wrap an existing contact-graph router (sharing its contact plan)
    pub fn with_inner(inner: ContactGraphRouter) -> Self {
        Self {
            inner,
            energy_levels: DashMap::new(),
        }
    }

    /// Record a battery reading for a node
    pub fn update_energy(&self, node: impl Into<NodeId>, battery_percent: f64) {
        self.energy_levels
            .insert(node.into(), battery_percent.clamp(0.0, 100.0));
    }

    /// The underlying contact-graph router
    pub fn contact_graph(&self) -> &ContactGraphRouter {
        &self.inner
    }

    /// Latest known battery for a neighbor, telemetry first
    fn battery_of(&self, neighbor: &Neighbor) -> Option<f64> {
        self.energy_levels
            .get(&neighbor.id)
            .map(|e| *e.value())
            .or(neighbor.battery_percent)
    }

    fn has_energy_for(&self, neighbor: &Neighbor, priority: Priority) -> bool {
        match self.battery_of(neighbor) {
            Some(level) => level >= min_battery_for(priority),
            // Unknown energy, assume eligible.
            None => true,
        }
    }
}

impl Default for EnergyAwareRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for EnergyAwareRouter {
    fn select_next_hop(
        &self,
        bundle: &Bundle,
        neighbors: &HashMap<NodeId, Neighbor>,
    ) -> Result<NodeId, RoutingError> {
        check_neighbors(neighbors)?;

        let eligible: HashMap<NodeId, Neighbor> = neighbors
            .iter()
            .filter(|(_, n)| {
                n.is_active
                    && (n.eid == bundle.destination || self.has_energy_for(n, bundle.priority))
            })
            .map(|(id, n)| (id.clone(), n.clone()))
            .collect();

        if eligible.is_empty() {
            trace!(bundle_id = %bundle.id, "Every active neighbor is below its energy threshold");
            return Err(RoutingError::NoRoute {
                destination: bundle.destination.to_string(),
            });
        }

        self.inner.select_next_hop(bundle, &eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(dest: &str, priority: Priority) -> Bundle {
        Bundle::with_priority("dtn://mars/sat-1", dest, b"telemetry".to_vec(), priority)
    }

    fn insert(map: &mut HashMap<NodeId, Neighbor>, n: Neighbor) {
        map.insert(n.id.clone(), n);
    }

    #[test]
    fn depleted_relay_is_excluded() {
        let router = EnergyAwareRouter::new();
        router.update_energy("relay-low", 5.0);

        let mut neighbors = HashMap::new();
        insert(
            &mut neighbors,
            Neighbor::new("relay-low", "dtn://relay/low").with_link_quality(1.0),
        );
        insert(
            &mut neighbors,
            Neighbor::new("relay-ok", "dtn://relay/ok").with_link_quality(0.4),
        );

        let hop = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Normal), &neighbors)
            .unwrap();
        assert_eq!(hop, NodeId::from("relay-ok"));
    }

    #[test]
    fn thresholds_scale_with_priority() {
        let router = EnergyAwareRouter::new();
        router.update_energy("relay-1", 15.0);

        let mut neighbors = HashMap::new();
        insert(&mut neighbors, Neighbor::new("relay-1", "dtn://relay/1"));

        // 15% battery: too low for bulk (30%) and normal (20%), enough for
        // expedited (10%).
        for priority in [Priority::Bulk, Priority::Normal] {
            let err = router
                .select_next_hop(&bundle("dtn://earth/gs-nyc", priority), &neighbors)
                .unwrap_err();
            assert!(matches!(err, RoutingError::NoRoute { .. }));
        }
        let hop = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Expedited), &neighbors)
            .unwrap();
        assert_eq!(hop, NodeId::from("relay-1"));
    }

    #[test]
    fn unknown_energy_is_eligible() {
        let router = EnergyAwareRouter::new();
        let mut neighbors = HashMap::new();
        insert(&mut neighbors, Neighbor::new("relay-1", "dtn://relay/1"));

        let hop = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Bulk), &neighbors)
            .unwrap();
        assert_eq!(hop, NodeId::from("relay-1"));
    }

    #[test]
    fn neighbor_embedded_battery_is_honored() {
        let router = EnergyAwareRouter::new();
        let mut neighbors = HashMap::new();
        insert(
            &mut neighbors,
            Neighbor::new("relay-1", "dtn://relay/1").with_battery(8.0),
        );
        insert(
            &mut neighbors,
            Neighbor::new("relay-2", "dtn://relay/2").with_battery(90.0),
        );

        let hop = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Normal), &neighbors)
            .unwrap();
        assert_eq!(hop, NodeId::from("relay-2"));
    }

    #[test]
    fn telemetry_overrides_embedded_battery() {
        let router = EnergyAwareRouter::new();
        // Embedded says fine, fresher telemetry says depleted.
        router.update_energy("relay-1", 2.0);

        let mut neighbors = HashMap::new();
        insert(
            &mut neighbors,
            Neighbor::new("relay-1", "dtn://relay/1").with_battery(80.0),
        );

        let err = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Normal), &neighbors)
            .unwrap_err();
        assert!(matches!(err, RoutingError::NoRoute { .. }));
    }

    #[test]
    fn direct_destination_bypasses_energy_gate() {
        let router = EnergyAwareRouter::new();
        router.update_energy("gs-nyc", 1.0);

        let mut neighbors = HashMap::new();
        insert(&mut neighbors, Neighbor::new("gs-nyc", "dtn://earth/gs-nyc"));

        let hop = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Bulk), &neighbors)
            .unwrap();
        assert_eq!(hop, NodeId::from("gs-nyc"));
    }

    #[test]
    fn baseline_guards_apply() {
        let router = EnergyAwareRouter::new();
        let err = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Normal), &HashMap::new())
            .unwrap_err();
        assert_eq!(err, RoutingError::NoNeighbors);

        let mut neighbors = HashMap::new();
        insert(
            &mut neighbors,
            Neighbor::new("relay-1", "dtn://relay/1").inactive(),
        );
        let err = router
            .select_next_hop(&bundle("dtn://earth/gs-nyc", Priority::Normal), &neighbors)
            .unwrap_err();
        assert_eq!(err, RoutingError::NoActiveNeighbors);
    }
}
