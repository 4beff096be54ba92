//! # Aether Core
//!
//! Core types, traits, and errors for the Aether delay-tolerant networking
//! stack.
//!
//! Aether moves data across links that are only intermittently available:
//! satellite passes, ground-station contact windows, lossy relays. The unit
//! of transfer is the [`Bundle`], a self-describing message that persists at
//! intermediate nodes until the next hop becomes reachable, rather than
//! requiring an end-to-end connected path.
//!
//! ## Key Types
//!
//! - [`Bundle`]: the store-and-forward transfer unit with identity,
//!   endpoints, payload, priority, lifetime, and provenance trail
//! - [`BundleStatus`]: lifecycle state, stored beside the bundle so status
//!   churn never rewrites payload bytes
//! - [`Neighbor`]: a directly reachable peer with link quality and activity,
//!   supplied and refreshed by the transport layer
//!
//! ## Key Traits
//!
//! - [`BundleStore`]: capacity-bounded persistence for bundles and their
//!   delivery status
//! - [`Router`]: next-hop selection over a volatile neighbor set
//! - [`Transport`]: the convergence layer that physically moves a bundle
//!   between nodes (consumed, not implemented here)
//! - [`Clock`]: time abstraction for deterministic testing

pub mod bundle;
pub mod error;
pub mod ids;
pub mod neighbor;
pub mod status;
pub mod traits;

pub use bundle::{Bundle, DEFAULT_LIFETIME, MAX_HOP_COUNT, Priority};
pub use error::{
    AetherError, BundleError, RoutingError, StorageError, TransportError,
};
pub use ids::{BundleId, Eid, NodeId};
pub use neighbor::Neighbor;
pub use status::BundleStatus;
pub use traits::{
    BundleFilter, BundleStore, Clock, ManualClock, Router, SystemClock, Transport,
};
