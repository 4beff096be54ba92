//! Identifier newtypes for bundles, endpoints, and nodes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a bundle
///
/// Assigned once at creation and immutable for the life of the bundle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct BundleId(Uuid);

impl BundleId {
    /// Generate a fresh bundle ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short prefix for log lines
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

/// Endpoint identifier, a logical address for a bundle's source or
/// destination, independent of the underlying transport address
///
/// By convention EIDs look like `dtn://mars/relay-1`, but the core treats
/// them as opaque non-empty strings.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct Eid(String);

impl Eid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Byte length, used for bundle size accounting
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for Eid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Eid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Transport-level node identifier
///
/// Names a concrete peer (a satellite, ground station, or relay process) as
/// opposed to the logical [`Eid`] address a bundle is headed for.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_ids_are_unique() {
        let a = BundleId::generate();
        let b = BundleId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn short_id_is_prefix() {
        let id = BundleId::generate();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().starts_with(&id.short()));
    }

    #[test]
    fn eid_round_trips_through_str() {
        let eid = Eid::from("dtn://mars/relay-1");
        assert_eq!(eid.as_str(), "dtn://mars/relay-1");
        assert_eq!(eid.to_string(), "dtn://mars/relay-1");
        assert!(!eid.is_empty());
    }
}
