//! The bundle: the unit of transfer in a delay-tolerant network
//!
//! A bundle is analogous to a packet but designed to persist across long or
//! uncertain link outages. It carries its own identity, endpoints, payload,
//! priority, lifetime, and provenance trail, so any node that holds it has
//! everything needed to keep forwarding it later.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::BundleError;
use crate::ids::{BundleId, Eid, NodeId};

/// Maximum number of hops a bundle may traverse before it is dropped
pub const MAX_HOP_COUNT: u32 = 255;

/// Default bundle lifetime when none is specified
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed per-bundle bookkeeping overhead, in bytes, counted by [`Bundle::size`]
const HEADER_OVERHEAD: usize = 64;

/// Priority levels for bundle transmission
///
/// Ordering matters: `Bulk < Normal < Expedited`. Stores evict
/// lower-priority bundles first under capacity pressure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Best effort, lowest priority
    Bulk,
    /// Standard delivery (default)
    #[default]
    Normal,
    /// Highest priority, critical data
    Expedited,
}

impl TryFrom<u8> for Priority {
    type Error = BundleError;

    /// Convert a raw priority value, rejecting anything outside 0..=2
    ///
    /// Invalid values are an error, never silently clamped.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Bulk),
            1 => Ok(Priority::Normal),
            2 => Ok(Priority::Expedited),
            other => Err(BundleError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        match p {
            Priority::Bulk => 0,
            Priority::Normal => 1,
            Priority::Expedited => 2,
        }
    }
}

/// A store-and-forward bundle
///
/// The payload is never mutated after creation. The only mutable fields are
/// the provenance trail (`hop_count`, `previous_node`), advanced exactly once
/// per transport-confirmed hand-off, and the priority/lifetime knobs.
/// Lifecycle status lives in the store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Unique identifier, assigned at creation
    pub id: BundleId,
    /// Originating endpoint
    pub source: Eid,
    /// Final destination endpoint
    pub destination: Eid,
    /// Opaque payload bytes
    pub payload: Vec<u8>,
    /// When the bundle was created
    pub created_at: DateTime<Utc>,
    /// Validity period; the bundle expires at `created_at + lifetime`
    pub lifetime: Duration,
    /// Transmission priority
    pub priority: Priority,
    /// Number of successful hand-offs so far
    pub hop_count: u32,
    /// The node that most recently forwarded this bundle
    pub previous_node: Option<NodeId>,
}

impl Bundle {
    /// Create a bundle with default priority and lifetime
    pub fn new(source: impl Into<Eid>, destination: impl Into<Eid>, payload: Vec<u8>) -> Self {
        Self {
            id: BundleId::generate(),
            source: source.into(),
            destination: destination.into(),
            payload,
            created_at: Utc::now(),
            lifetime: DEFAULT_LIFETIME,
            priority: Priority::default(),
            hop_count: 0,
            previous_node: None,
        }
    }

    /// Create a bundle with an explicit priority
    pub fn with_priority(
        source: impl Into<Eid>,
        destination: impl Into<Eid>,
        payload: Vec<u8>,
        priority: Priority,
    ) -> Self {
        let mut bundle = Self::new(source, destination, payload);
        bundle.priority = priority;
        bundle
    }

    /// Check structural invariants
    ///
    /// Fails on empty endpoints, a zero lifetime, or an out-of-range hop
    /// count. Expiration is deliberately not checked here: it is a runtime
    /// predicate ([`Bundle::is_expired`]), not a structural invariant.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.source.is_empty() {
            return Err(BundleError::EmptySourceEid);
        }
        if self.destination.is_empty() {
            return Err(BundleError::EmptyDestinationEid);
        }
        if self.lifetime.is_zero() {
            return Err(BundleError::ZeroLifetime);
        }
        if self.hop_count > MAX_HOP_COUNT {
            return Err(BundleError::HopLimitExceeded { max: MAX_HOP_COUNT });
        }
        Ok(())
    }

    /// Set the priority from a raw wire value
    ///
    /// Rejects values outside the defined levels and leaves the prior value
    /// unchanged on failure.
    pub fn set_priority(&mut self, raw: u8) -> Result<(), BundleError> {
        self.priority = Priority::try_from(raw)?;
        Ok(())
    }

    /// Replace the bundle lifetime
    pub fn set_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    /// Content digest over source, destination, and payload bytes
    ///
    /// A pure function of those three fields: two bundles with identical
    /// endpoints and payload hash identically, regardless of ID, timestamps,
    /// or provenance. Stable across process restarts; used for deduplication
    /// and integrity checks, not for routing. Each field is length-framed so
    /// that field boundaries cannot be confused.
    pub fn hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for field in [
            self.source.as_str().as_bytes(),
            self.destination.as_str().as_bytes(),
            self.payload.as_slice(),
        ] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        hex::encode(hasher.finalize().as_bytes())
    }

    /// The instant this bundle expires
    ///
    /// Lifetimes too large to represent saturate to the far future.
    pub fn expires_at(&self) -> DateTime<Utc> {
        ChronoDuration::from_std(self.lifetime)
            .ok()
            .and_then(|d| self.created_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the bundle is past its lifetime at `now`
    ///
    /// An expired bundle must never be forwarded, regardless of its stored
    /// status.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// Time until expiration at `now`, zero if already expired
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Record a successful hand-off through `node`
    ///
    /// Increments the hop count by exactly one and overwrites the previous
    /// node. Called once per transport-confirmed forwarding step, never
    /// speculatively.
    pub fn increment_hop(&mut self, node: NodeId) -> Result<(), BundleError> {
        if self.hop_count >= MAX_HOP_COUNT {
            return Err(BundleError::HopLimitExceeded { max: MAX_HOP_COUNT });
        }
        self.hop_count += 1;
        self.previous_node = Some(node);
        Ok(())
    }

    /// Approximate size in bytes, payload plus bookkeeping overhead
    pub fn size(&self) -> usize {
        HEADER_OVERHEAD
            + self.source.len()
            + self.destination.len()
            + self.previous_node.as_ref().map_or(0, |n| n.len())
            + self.payload.len()
    }
}

impl std::fmt::Display for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bundle[id={}, src={}, dst={}, priority={:?}, hops={}, size={}]",
            self.id.short(),
            self.source,
            self.destination,
            self.priority,
            self.hop_count,
            self.size()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bundle() -> Bundle {
        Bundle::new("dtn://mars/sat-1", "dtn://earth/gs-nyc", b"telemetry".to_vec())
    }

    #[test]
    fn new_bundle_has_defaults() {
        let b = test_bundle();
        assert_eq!(b.priority, Priority::Normal);
        assert_eq!(b.lifetime, DEFAULT_LIFETIME);
        assert_eq!(b.hop_count, 0);
        assert!(b.previous_node.is_none());
        assert!(b.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_endpoints() {
        let mut b = test_bundle();
        b.source = Eid::from("");
        assert!(matches!(b.validate(), Err(BundleError::EmptySourceEid)));

        let mut b = test_bundle();
        b.destination = Eid::from("");
        assert!(matches!(b.validate(), Err(BundleError::EmptyDestinationEid)));
    }

    #[test]
    fn validate_rejects_zero_lifetime() {
        let mut b = test_bundle();
        b.set_lifetime(Duration::ZERO);
        assert!(matches!(b.validate(), Err(BundleError::ZeroLifetime)));
    }

    #[test]
    fn priority_from_raw_value() {
        assert_eq!(Priority::try_from(0).unwrap(), Priority::Bulk);
        assert_eq!(Priority::try_from(2).unwrap(), Priority::Expedited);
        assert!(matches!(
            Priority::try_from(3),
            Err(BundleError::InvalidPriority(3))
        ));
    }

    #[test]
    fn set_priority_leaves_prior_value_on_failure() {
        let mut b = Bundle::with_priority(
            "dtn://a",
            "dtn://b",
            vec![],
            Priority::Expedited,
        );
        assert!(b.set_priority(7).is_err());
        assert_eq!(b.priority, Priority::Expedited);

        b.set_priority(0).unwrap();
        assert_eq!(b.priority, Priority::Bulk);
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Bulk < Priority::Normal);
        assert!(Priority::Normal < Priority::Expedited);
    }

    #[test]
    fn clone_shares_no_payload_storage() {
        let original = test_bundle();
        let mut copy = original.clone();
        copy.payload[0] = b'X';
        assert_eq!(original.payload, b"telemetry");
        assert_ne!(copy.payload, original.payload);
    }

    #[test]
    fn hash_is_stable_and_content_addressed() {
        let b = test_bundle();
        assert_eq!(b.hash(), b.hash());

        // Identical endpoints + payload hash identically even with a new ID.
        let twin = Bundle::new("dtn://mars/sat-1", "dtn://earth/gs-nyc", b"telemetry".to_vec());
        assert_ne!(twin.id, b.id);
        assert_eq!(twin.hash(), b.hash());

        // Changing any of the three inputs changes the digest.
        let mut other = b.clone();
        other.payload = b"telemetrz".to_vec();
        assert_ne!(other.hash(), b.hash());

        let mut other = b.clone();
        other.source = Eid::from("dtn://mars/sat-2");
        assert_ne!(other.hash(), b.hash());

        let mut other = b.clone();
        other.destination = Eid::from("dtn://earth/gs-la");
        assert_ne!(other.hash(), b.hash());
    }

    #[test]
    fn hash_ignores_provenance_and_priority() {
        let b = test_bundle();
        let mut forwarded = b.clone();
        forwarded.increment_hop(NodeId::from("relay-1")).unwrap();
        forwarded.priority = Priority::Expedited;
        assert_eq!(forwarded.hash(), b.hash());
    }

    #[test]
    fn expiration_is_monotonic() {
        let b = test_bundle();
        assert!(b.expires_at() > b.created_at);

        let now = b.created_at;
        assert!(!b.is_expired(now));
        let later = now + ChronoDuration::hours(1);
        assert!(b.remaining_lifetime(later) < b.remaining_lifetime(now));
        assert!(b.remaining_lifetime(now) > Duration::ZERO);

        let past_expiry = b.expires_at() + ChronoDuration::seconds(1);
        assert!(b.is_expired(past_expiry));
        assert_eq!(b.remaining_lifetime(past_expiry), Duration::ZERO);
    }

    #[test]
    fn hop_provenance() {
        let mut b = test_bundle();
        b.increment_hop(NodeId::from("node-1")).unwrap();
        assert_eq!(b.hop_count, 1);
        assert_eq!(b.previous_node, Some(NodeId::from("node-1")));

        b.increment_hop(NodeId::from("node-2")).unwrap();
        assert_eq!(b.hop_count, 2);
        assert_eq!(b.previous_node, Some(NodeId::from("node-2")));
    }

    #[test]
    fn hop_limit_enforced() {
        let mut b = test_bundle();
        b.hop_count = MAX_HOP_COUNT;
        let err = b.increment_hop(NodeId::from("node-1")).unwrap_err();
        assert!(matches!(err, BundleError::HopLimitExceeded { .. }));
        assert_eq!(b.hop_count, MAX_HOP_COUNT);
        assert!(b.previous_node.is_none());
    }

    #[test]
    fn size_includes_payload_and_overhead() {
        let b = test_bundle();
        assert!(b.size() >= b.payload.len());
        assert!(b.size() >= b.payload.len() + b.source.len() + b.destination.len());
    }
}
