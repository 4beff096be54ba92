//! Error types for the Aether DTN stack
//!
//! The taxonomy mirrors how failures are handled: validation and storage
//! errors propagate immediately to the caller; routing errors go to the
//! forwarding loop, which treats them as "retry later"; capacity pressure is
//! handled by eviction and never surfaces as an error; expiration is a
//! status transition, not an error at all.

use thiserror::Error;

use crate::ids::{BundleId, NodeId};
use crate::status::BundleStatus;

/// Top-level error type for Aether
#[derive(Debug, Error)]
pub enum AetherError {
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Bundle construction and mutation errors
///
/// Always surfaced to the caller at construction/mutation time, never
/// silently corrected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("source EID cannot be empty")]
    EmptySourceEid,

    #[error("destination EID cannot be empty")]
    EmptyDestinationEid,

    #[error("invalid priority: {0} (must be 0-2)")]
    InvalidPriority(u8),

    #[error("bundle lifetime must be non-zero")]
    ZeroLifetime,

    #[error("max hop count exceeded ({max})")]
    HopLimitExceeded { max: u32 },
}

/// Bundle store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// No bundle with the given ID
    #[error("bundle not found: {0}")]
    NotFound(BundleId),

    /// The bundle failed validation on insert
    #[error("invalid bundle: {0}")]
    InvalidBundle(#[from] BundleError),

    /// Illegal transition out of a terminal status
    #[error("cannot transition bundle out of terminal status {from} (to {to})")]
    TerminalStatus {
        from: BundleStatus,
        to: BundleStatus,
    },

    /// Backing-store I/O failure (durable implementations)
    #[error("storage I/O error: {0}")]
    Io(String),
}

/// Routing errors
///
/// Surfaced to the forwarding loop, which interprets them as "retry at the
/// next contact opportunity," not as fatal conditions. The three failure
/// modes are deliberately distinguishable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// The neighbor map was empty
    #[error("no neighbors available")]
    NoNeighbors,

    /// Neighbors exist but none is active
    #[error("no active neighbors")]
    NoActiveNeighbors,

    /// Active neighbors exist but none can reach the destination
    #[error("no viable route to destination: {destination}")]
    NoRoute { destination: String },
}

/// Transport (convergence layer) errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected to node: {0}")]
    NotConnected(NodeId),

    #[error("send failed: {0}")]
    SendFailed(String),
}
