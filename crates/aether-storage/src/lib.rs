//! # Aether Storage
//!
//! Capacity-bounded bundle persistence for the Aether DTN stack.
//!
//! This crate provides [`InMemoryBundleStore`], the in-memory implementation
//! of the [`BundleStore`](aether_core::BundleStore) contract. A durable
//! relational backend is another implementation of the same trait; the
//! reference schema is documented on the trait itself.
//!
//! ## Eviction policy
//!
//! When an insert would push the store past its configured capacity, an
//! eviction pass runs under the same exclusive lock as the insert, so the
//! post-insert count never exceeds capacity even with concurrent writers.
//! Victims are chosen in this order:
//!
//! 1. bundles already past their lifetime
//! 2. bundles in a terminal status (delivered, failed, expired)
//! 3. non-terminal bundles, lowest priority first, then oldest first
//!
//! A pending or in-transit bundle is never evicted while any terminal-status
//! bundle remains.

mod eviction;
pub mod memory;

pub use memory::InMemoryBundleStore;
