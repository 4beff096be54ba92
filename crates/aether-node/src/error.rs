//! Error types for the node orchestrator

use thiserror::Error;

use aether_core::{BundleError, RoutingError, StorageError, TransportError};

/// Errors surfaced by a [`Node`](crate::Node)
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The ingress or egress queue is full; the bundle was not accepted
    #[error("{0} queue full")]
    QueueFull(&'static str),

    /// `start` was called twice
    #[error("node already started")]
    AlreadyStarted,
}
