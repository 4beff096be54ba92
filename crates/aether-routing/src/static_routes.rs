//! Static routing over a fixed destination table
//!
//! The simplest strategy: an operator-configured map from destination EID to
//! next-hop node. Used for ground segments with known topology and as the
//! predictable baseline in tests.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::trace;

use aether_core::{Bundle, Eid, Neighbor, NodeId, Router, RoutingError};

use crate::check_neighbors;

/// Router backed by a fixed destination → next-hop table
///
/// Lookup is exact-match first, then longest-prefix on the EID string, so a
/// single `dtn://mars` entry can cover every Mars endpoint. The resolved
/// next hop must be present and active in the current neighbor map; a
/// destination with no usable table entry fails with
/// [`RoutingError::NoRoute`].
#[derive(Debug, Default)]
pub struct StaticRouter {
    routes: DashMap<Eid, NodeId>,
}

impl StaticRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a route
    pub fn add_route(&self, destination: impl Into<Eid>, next_hop: impl Into<NodeId>) {
        self.routes.insert(destination.into(), next_hop.into());
    }

    /// Remove a route, returning the old next hop if one existed
    pub fn remove_route(&self, destination: &Eid) -> Option<NodeId> {
        self.routes.remove(destination).map(|(_, hop)| hop)
    }

    /// Number of configured routes
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Snapshot of the route table
    pub fn routes(&self) -> HashMap<Eid, NodeId> {
        self.routes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Return the table entry whose EID is the longest prefix of `destination`
    fn longest_prefix_match(&self, destination: &Eid) -> Option<NodeId> {
        self.routes
            .iter()
            .filter(|entry| destination.as_str().starts_with(entry.key().as_str()))
            .max_by_key(|entry| entry.key().len())
            .map(|entry| entry.value().clone())
    }
}

impl Router for StaticRouter {
    fn select_next_hop(
        &self,
        bundle: &Bundle,
        neighbors: &HashMap<NodeId, Neighbor>,
    ) -> Result<NodeId, RoutingError> {
        check_neighbors(neighbors)?;

        let hop = self
            .routes
            .get(&bundle.destination)
            .map(|entry| entry.value().clone())
            .or_else(|| self.longest_prefix_match(&bundle.destination));

        match hop {
            Some(hop) if neighbors.get(&hop).is_some_and(|n| n.is_active) => {
                trace!(bundle_id = %bundle.id, next_hop = %hop, "Static route matched");
                Ok(hop)
            }
            _ => Err(RoutingError::NoRoute {
                destination: bundle.destination.to_string(),
            }),
        }
    }
}
