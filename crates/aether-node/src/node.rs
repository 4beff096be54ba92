//! The DTN node: forwarding loop, neighbor registry, maintenance sweep

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use aether_core::{
    Bundle, BundleFilter, BundleId, BundleStatus, BundleStore, Clock, Eid, Neighbor, NodeId,
    Router, StorageError, SystemClock, Transport,
};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::{Counters, NodeMetrics};

/// Result of one forwarding evaluation for a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Confirmed hand-off to the destination itself
    Delivered(NodeId),
    /// Confirmed hand-off to an intermediate hop
    Forwarded(NodeId),
    /// The router found no viable hop; the bundle stays pending
    NoRoute,
    /// Hand-off unconfirmed; provenance untouched, bundle stays pending
    Retry,
    /// Retry budget exhausted
    Failed,
    /// The bundle hit its lifetime before a hand-off
    Expired,
    /// The bundle was no longer pending (settled or removed by a peer worker)
    Settled,
}

struct NodeInner<S, R, T> {
    id: NodeId,
    eid: Eid,
    store: S,
    router: R,
    transport: T,
    clock: Arc<dyn Clock>,
    config: NodeConfig,
    neighbors: RwLock<HashMap<NodeId, Neighbor>>,
    counters: Counters,
    retry_counts: Mutex<HashMap<BundleId, u32>>,
    egress_tx: mpsc::Sender<Bundle>,
}

impl<S, R, T> NodeInner<S, R, T>
where
    S: BundleStore,
    R: Router,
    T: Transport,
{
    fn neighbors_snapshot(&self) -> HashMap<NodeId, Neighbor> {
        self.neighbors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Process one incoming bundle: deliver locally or store for forwarding
    async fn handle_incoming(&self, bundle: Bundle) -> Result<(), NodeError> {
        bundle.validate()?;

        let now = self.clock.now_utc();
        if bundle.is_expired(now) {
            debug!(bundle_id = %bundle.id, "Incoming bundle already expired");
            self.counters.add(&self.counters.bundles_expired, 1);
            return Ok(());
        }

        if bundle.destination == self.eid {
            let id = bundle.id;
            let source = bundle.source.clone();
            self.store.store(bundle).await?;
            self.store.update_status(id, BundleStatus::Delivered).await?;
            self.counters.add(&self.counters.delivered_local, 1);
            info!(bundle_id = %id, source = %source, "Bundle delivered locally");
            return Ok(());
        }

        self.store.store(bundle.clone()).await?;
        // If the egress queue is full the bundle stays pending; the retry
        // pump re-queues it.
        if self.egress_tx.try_send(bundle).is_err() {
            debug!("Egress queue full, bundle left pending");
        }
        Ok(())
    }

    /// One forwarding evaluation for a bundle
    ///
    /// Only a transport-confirmed hand-off advances the provenance trail and
    /// status; every failure path leaves the bundle pending for the next
    /// contact opportunity.
    async fn forward(&self, bundle: Bundle) -> Result<ForwardOutcome, NodeError> {
        // A peer worker, the purge sweep, or eviction may have settled or
        // removed this bundle since it was queued.
        match self.store.get_status(bundle.id).await {
            Ok(BundleStatus::Pending) => {}
            Ok(_) => return Ok(ForwardOutcome::Settled),
            Err(StorageError::NotFound(_)) => return Ok(ForwardOutcome::Settled),
            Err(err) => return Err(err.into()),
        }

        // An expired bundle is never offered to the router.
        let now = self.clock.now_utc();
        if bundle.is_expired(now) {
            self.store.update_status(bundle.id, BundleStatus::Expired).await?;
            self.clear_retries(bundle.id);
            self.counters.add(&self.counters.bundles_expired, 1);
            debug!(bundle_id = %bundle.id, "Bundle expired before hand-off");
            return Ok(ForwardOutcome::Expired);
        }

        let neighbors = self.neighbors_snapshot();
        let next_hop = match self.router.select_next_hop(&bundle, &neighbors) {
            Ok(hop) => hop,
            Err(err) => {
                debug!(
                    bundle_id = %bundle.id,
                    dest = %bundle.destination,
                    %err,
                    "No route, retrying next cycle"
                );
                return Ok(ForwardOutcome::NoRoute);
            }
        };
        let reaches_destination = neighbors
            .get(&next_hop)
            .is_some_and(|n| n.eid == bundle.destination);

        let confirmed = match self.transport.attempt_handoff(&next_hop, &bundle).await {
            Ok(confirmed) => confirmed,
            Err(err) => {
                warn!(bundle_id = %bundle.id, next_hop = %next_hop, %err, "Hand-off failed");
                false
            }
        };
        if !confirmed {
            return self.record_handoff_failure(bundle.id).await;
        }

        let mut bundle = bundle;
        bundle.increment_hop(self.id.clone())?;
        self.store.store(bundle.clone()).await?;
        let status = if reaches_destination {
            BundleStatus::Delivered
        } else {
            BundleStatus::InTransit
        };
        self.store.update_status(bundle.id, status).await?;
        self.clear_retries(bundle.id);
        self.counters.add(&self.counters.bundles_sent, 1);
        self.counters.add(&self.counters.bytes_sent, bundle.size() as u64);
        info!(bundle_id = %bundle.id, next_hop = %next_hop, %status, "Bundle handed off");

        Ok(if reaches_destination {
            ForwardOutcome::Delivered(next_hop)
        } else {
            ForwardOutcome::Forwarded(next_hop)
        })
    }

    async fn record_handoff_failure(&self, id: BundleId) -> Result<ForwardOutcome, NodeError> {
        let failures = {
            let mut counts = self.retry_counts.lock().unwrap_or_else(|e| e.into_inner());
            let entry = counts.entry(id).or_insert(0);
            *entry += 1;
            *entry
        };
        if failures >= self.config.max_retries {
            self.store.update_status(id, BundleStatus::Failed).await?;
            self.clear_retries(id);
            self.counters.add(&self.counters.bundles_failed, 1);
            warn!(bundle_id = %id, failures, "Retry budget exhausted, bundle failed");
            Ok(ForwardOutcome::Failed)
        } else {
            debug!(bundle_id = %id, failures, "Hand-off unconfirmed, will retry");
            Ok(ForwardOutcome::Retry)
        }
    }

    fn clear_retries(&self, id: BundleId) {
        self.retry_counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    /// Drop retry tracking for bundles that are no longer pending
    ///
    /// A bundle can leave the pending state without passing through the
    /// forwarding loop (purged, evicted, deleted), so its retry entry must
    /// be reclaimed here or the map grows without bound.
    async fn sweep_retry_counts(&self) {
        let tracked: Vec<BundleId> = self
            .retry_counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        for id in tracked {
            let pending = matches!(
                self.store.get_status(id).await,
                Ok(BundleStatus::Pending)
            );
            if !pending {
                self.clear_retries(id);
            }
        }
    }

    /// Re-queue pending bundles for another forwarding evaluation
    async fn pump_pending(&self) {
        match self
            .store
            .list(BundleFilter::by_status(BundleStatus::Pending))
            .await
        {
            Ok(pending) => {
                for bundle in pending {
                    if self.egress_tx.try_send(bundle).is_err() {
                        break;
                    }
                }
            }
            Err(err) => warn!(%err, "Failed to list pending bundles"),
        }
    }

    /// Purge expired bundles and mark stale neighbors inactive
    async fn run_maintenance(&self) {
        let now = self.clock.now_utc();
        // Bundles already marked Expired were counted when they were marked;
        // the purge tally must only cover newly discovered expirations.
        let already_marked = match self
            .store
            .list(BundleFilter::by_status(BundleStatus::Expired))
            .await
        {
            Ok(marked) => marked.len(),
            Err(_) => 0,
        };
        match self.store.purge_expired(now).await {
            Ok(0) => {}
            Ok(purged) => {
                let newly_expired = purged.saturating_sub(already_marked);
                if newly_expired > 0 {
                    self.counters
                        .add(&self.counters.bundles_expired, newly_expired as u64);
                }
                info!(purged, "Purged expired bundles");
            }
            Err(err) => warn!(%err, "Purge sweep failed"),
        }
        self.sweep_retry_counts().await;

        let threshold = chrono::Duration::from_std(self.config.neighbor_stale_after)
            .ok()
            .and_then(|d| now.checked_sub_signed(d));
        let Some(threshold) = threshold else { return };

        let mut neighbors = self.neighbors.write().unwrap_or_else(|e| e.into_inner());
        for neighbor in neighbors.values_mut() {
            if neighbor.is_active && neighbor.last_contact < threshold {
                debug!(neighbor = %neighbor.id, "Neighbor stale, marking inactive");
                neighbor.is_active = false;
            }
        }
    }
}

/// A DTN node: store, router, transport, and the workers that connect them
pub struct Node<S, R, T> {
    inner: Arc<NodeInner<S, R, T>>,
    ingress_tx: mpsc::Sender<Bundle>,
    ingress_rx: Mutex<Option<mpsc::Receiver<Bundle>>>,
    egress_rx: Mutex<Option<mpsc::Receiver<Bundle>>>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S, R, T> Node<S, R, T>
where
    S: BundleStore + 'static,
    R: Router + 'static,
    T: Transport + 'static,
{
    /// Create a node with the system clock
    pub fn new(
        id: impl Into<NodeId>,
        eid: impl Into<Eid>,
        store: S,
        router: R,
        transport: T,
        config: NodeConfig,
    ) -> Self {
        Self::with_clock(id, eid, store, router, transport, config, Arc::new(SystemClock))
    }

    /// Create a node with an injected clock, for deterministic tests
    pub fn with_clock(
        id: impl Into<NodeId>,
        eid: impl Into<Eid>,
        store: S,
        router: R,
        transport: T,
        config: NodeConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (ingress_tx, ingress_rx) = mpsc::channel(config.channel_capacity);
        let (egress_tx, egress_rx) = mpsc::channel(config.channel_capacity);
        let (shutdown_tx, _) = broadcast::channel(1);

        let inner = Arc::new(NodeInner {
            id: id.into(),
            eid: eid.into(),
            store,
            router,
            transport,
            clock,
            config,
            neighbors: RwLock::new(HashMap::new()),
            counters: Counters::default(),
            retry_counts: Mutex::new(HashMap::new()),
            egress_tx,
        });

        Self {
            inner,
            ingress_tx,
            ingress_rx: Mutex::new(Some(ingress_rx)),
            egress_rx: Mutex::new(Some(egress_rx)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// This node's transport identifier
    pub fn id(&self) -> &NodeId {
        &self.inner.id
    }

    /// The endpoint this node answers for
    pub fn eid(&self) -> &Eid {
        &self.inner.eid
    }

    /// The bundle store this node forwards from
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Spawn the ingress, egress, retry, and maintenance workers
    pub fn start(&self) -> Result<(), NodeError> {
        let ingress_rx = self
            .ingress_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(NodeError::AlreadyStarted)?;
        let egress_rx = self
            .egress_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(NodeError::AlreadyStarted)?;

        info!(node = %self.inner.id, eid = %self.inner.eid, "Starting DTN node");
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.push(self.spawn_ingress(ingress_rx));
        tasks.push(self.spawn_egress(egress_rx));
        tasks.push(self.spawn_retry_pump());
        tasks.push(self.spawn_maintenance());
        Ok(())
    }

    /// Signal the workers to stop and wait for them to finish
    ///
    /// Workers complete the bundle in hand before exiting; no bundle is left
    /// partially transitioned.
    pub async fn shutdown(&self) {
        info!(node = %self.inner.id, "Shutting down DTN node");
        let _ = self.shutdown_tx.send(());
        let tasks: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for task in tasks {
            let _ = task.await;
        }
    }

    /// Queue a locally originated bundle for forwarding
    ///
    /// The bundle is stored before it is queued. A full egress queue is
    /// reported as [`NodeError::QueueFull`]; the bundle is still stored and
    /// pending at that point (retrievable by its ID from [`Node::store`]),
    /// and the retry pump will queue it on a later cycle.
    pub async fn send(&self, bundle: Bundle) -> Result<BundleId, NodeError> {
        bundle.validate()?;
        let id = bundle.id;
        self.inner.store.store(bundle.clone()).await?;
        if self.inner.egress_tx.try_send(bundle).is_err() {
            return Err(NodeError::QueueFull("egress"));
        }
        Ok(id)
    }

    /// Accept an incoming bundle from the transport layer
    pub fn receive(&self, bundle: Bundle) -> Result<(), NodeError> {
        let size = bundle.size() as u64;
        match self.ingress_tx.try_send(bundle) {
            Ok(()) => {
                self.inner.counters.add(&self.inner.counters.bundles_received, 1);
                self.inner.counters.add(&self.inner.counters.bytes_received, size);
                Ok(())
            }
            Err(_) => {
                self.inner.counters.add(&self.inner.counters.bundles_dropped, 1);
                Err(NodeError::QueueFull("ingress"))
            }
        }
    }

    /// Run one forwarding evaluation for a stored bundle
    ///
    /// This is the same evaluation the egress worker runs; exposing it lets
    /// callers (and tests) drive single contact opportunities directly.
    pub async fn forward(&self, bundle: Bundle) -> Result<ForwardOutcome, NodeError> {
        self.inner.forward(bundle).await
    }

    /// Add or refresh a neighbor, stamping it with the current time
    pub fn register_neighbor(&self, mut neighbor: Neighbor) {
        neighbor.last_contact = self.inner.clock.now_utc();
        debug!(node = %self.inner.id, neighbor = %neighbor.id, "Registered neighbor");
        self.inner
            .neighbors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(neighbor.id.clone(), neighbor);
    }

    /// Remove a neighbor, returning it if it was registered
    pub fn unregister_neighbor(&self, id: &NodeId) -> Option<Neighbor> {
        self.inner
            .neighbors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    /// Snapshot of the current neighbor map
    pub fn neighbors(&self) -> HashMap<NodeId, Neighbor> {
        self.inner.neighbors_snapshot()
    }

    /// Number of bundles with recorded hand-off failures awaiting retry
    pub fn tracked_retries(&self) -> usize {
        self.inner
            .retry_counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Point-in-time metrics snapshot
    pub fn metrics(&self) -> NodeMetrics {
        let active = self
            .inner
            .neighbors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|n| n.is_active)
            .count();
        self.inner.counters.snapshot(active)
    }

    /// Run one maintenance sweep (purge + neighbor staleness) immediately
    pub async fn run_maintenance(&self) {
        self.inner.run_maintenance().await;
    }

    fn spawn_ingress(&self, mut rx: mpsc::Receiver<Bundle>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    maybe = rx.recv() => match maybe {
                        Some(bundle) => {
                            if let Err(err) = inner.handle_incoming(bundle).await {
                                inner.counters.add(&inner.counters.bundles_dropped, 1);
                                warn!(%err, "Dropped incoming bundle");
                            }
                        }
                        None => break,
                    },
                }
            }
        })
    }

    fn spawn_egress(&self, mut rx: mpsc::Receiver<Bundle>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    maybe = rx.recv() => match maybe {
                        Some(bundle) => {
                            if let Err(err) = inner.forward(bundle).await {
                                warn!(%err, "Forwarding evaluation failed");
                            }
                        }
                        None => break,
                    },
                }
            }
        })
    }

    fn spawn_retry_pump(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(inner.config.retry_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tick.tick() => inner.pump_pending().await,
                }
            }
        })
    }

    fn spawn_maintenance(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(inner.config.purge_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so a fresh node does
            // not sweep before anything is stored.
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tick.tick() => inner.run_maintenance().await,
                }
            }
        })
    }
}
