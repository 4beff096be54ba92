//! # Aether Node
//!
//! The forwarding-loop orchestrator for an Aether DTN node (satellite,
//! ground station, or relay process).
//!
//! A [`Node`] ties the other crates together: it pulls pending bundles from
//! the store, asks its router for a next hop over the current neighbor
//! snapshot, attempts the hand-off via the transport, and updates bundle
//! status based on the outcome. Routing failures are not fatal; the bundle
//! stays pending and is retried at the next contact opportunity.
//!
//! ## Workers
//!
//! [`Node::start`] spawns four background workers:
//!
//! - **ingress**: validates incoming bundles, delivers local ones, stores
//!   and queues the rest for forwarding
//! - **egress**: runs one forwarding evaluation per queued bundle
//! - **retry pump**: periodically re-queues pending bundles, bounding retry
//!   frequency so the loop never spins when no contacts are available
//! - **maintenance**: purges expired bundles and marks stale neighbors
//!   inactive
//!
//! All workers stop cleanly on [`Node::shutdown`], finishing the bundle in
//! hand first; status updates are atomic single-bundle store operations and
//! are never left half-applied.

pub mod config;
pub mod error;
pub mod metrics;
pub mod node;

pub use config::NodeConfig;
pub use error::NodeError;
pub use metrics::NodeMetrics;
pub use node::{ForwardOutcome, Node};
