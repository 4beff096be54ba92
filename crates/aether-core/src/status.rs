//! Bundle lifecycle status
//!
//! Status is stored beside the bundle, never inside it, so that the
//! pending → in-transit → delivered churn of normal operation never touches
//! payload bytes.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored bundle
///
/// Transitions: `Pending → InTransit` on an attempted hand-off, then
/// `Delivered`, `Failed`, or `Expired`. The last three are terminal: no
/// transition leaves a terminal state except deletion from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BundleStatus {
    /// Awaiting transmission (default on store)
    #[default]
    Pending,
    /// Handed off to a next hop, not yet at its destination
    InTransit,
    /// Confirmed received by the destination
    Delivered,
    /// Hand-off attempts exhausted
    Failed,
    /// Lifetime elapsed while still pending or in transit
    Expired,
}

impl BundleStatus {
    /// Whether this state admits no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BundleStatus::Delivered | BundleStatus::Failed | BundleStatus::Expired
        )
    }

    /// Wire name, matching the relational schema's `status` column
    pub fn as_str(self) -> &'static str {
        match self {
            BundleStatus::Pending => "pending",
            BundleStatus::InTransit => "in_transit",
            BundleStatus::Delivered => "delivered",
            BundleStatus::Failed => "failed",
            BundleStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
