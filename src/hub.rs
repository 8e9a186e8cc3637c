//! The dispatch hub
//!
//! `Hub` owns the serializing loop at the center of the system: a single
//! spawned task consumes one mailbox of tagged commands — publish,
//! register, unregister, stop — processing exactly one at a time, so the
//! subscriber list and the replay buffer are mutated from one place only
//! and need no locks.
//!
//! # Flow
//!
//! ```text
//! producer ──→ submit() ──→ [mailbox (bounded, blocks producer)]
//!                                  │
//!                           dispatch loop
//!                                  ├──→ replay buffer (last 64)
//!                                  └──→ try_send to every selector queue
//!                                       (full queue = entry dropped for
//!                                        that selector only)
//! ```
//!
//! Backpressure is asymmetric by design: `submit` suspends the producer
//! while the mailbox is full and never drops, whereas fan-out to
//! selector queues is always a non-blocking attempt — one slow consumer
//! loses data rather than stalling ingestion or its peers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::entry::Entry;
use crate::error::HubError;
use crate::history::History;
use crate::layer::HubLayer;

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;

/// Capacity of the ingest mailbox
pub const MAILBOX_CAPACITY: usize = 64;

/// Commands consumed by the dispatch loop
pub(crate) enum Command {
    Publish(Arc<Entry>),
    Register {
        outlet: Outlet,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: u64,
        ack: oneshot::Sender<()>,
    },
    Stop,
}

/// The hub-side delivery handle for one registered selector
pub(crate) struct Outlet {
    pub(crate) id: u64,
    pub(crate) queue: mpsc::Sender<Arc<Entry>>,
}

/// The log-entry dispatch hub
///
/// Constructing a hub spawns its dispatch loop; the loop runs until
/// [`Hub::stop`] is awaited. All methods are callable from any task.
#[derive(Debug)]
pub struct Hub {
    tx: mpsc::Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Process reference timestamp, captured once at construction
    epoch: DateTime<Utc>,
    next_id: AtomicU64,
    subscriber_count: Arc<AtomicUsize>,
    published: Arc<AtomicU64>,
}

impl Hub {
    /// Create a hub and start its dispatch loop
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let subscriber_count = Arc::new(AtomicUsize::new(0));
        let published = Arc::new(AtomicU64::new(0));

        let dispatch = DispatchLoop {
            rx,
            history: History::new(),
            outlets: Vec::new(),
            subscriber_count: Arc::clone(&subscriber_count),
            published: Arc::clone(&published),
        };
        let worker = tokio::spawn(dispatch.run());

        Self {
            tx,
            worker: Mutex::new(Some(worker)),
            epoch: Utc::now(),
            next_id: AtomicU64::new(1),
            subscriber_count,
            published,
        }
    }

    /// Submit an entry for distribution
    ///
    /// Suspends the caller while the ingest mailbox is full. Entries are
    /// never dropped here; shedding happens only at full selector queues.
    /// Fails only once the hub has been stopped.
    pub async fn submit(&self, entry: Entry) -> Result<(), HubError> {
        self.tx
            .send(Command::Publish(Arc::new(entry)))
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// The process reference timestamp, for computing relative entry times
    #[inline]
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Number of currently registered selectors
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::Relaxed)
    }

    /// Total entries distributed by the loop so far
    pub fn entries_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// A `tracing` layer that feeds this hub (see [`HubLayer`])
    pub fn layer(&self) -> HubLayer {
        HubLayer::new(self.tx.clone())
    }

    /// Remove a selector from the fan-out set
    ///
    /// Suspends until the loop has processed the removal; no further
    /// entries are delivered afterwards, though entries already queued
    /// remain drainable. The selector itself stays usable.
    pub async fn unregister(&self, selector: &crate::selector::Selector) -> Result<(), HubError> {
        self.unregister_id(selector.id()).await
    }

    /// Stop the hub: unregister every live selector, terminate the loop,
    /// and wait for the worker task to exit. Idempotent-safe.
    pub async fn stop(&self) {
        // The loop exits after finishing its current message.
        let _ = self.tx.send(Command::Stop).await;

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            let _ = handle.await;
        }
    }

    /// Register a delivery queue; returns the assigned subscriber id
    ///
    /// Suspends until the loop has added the outlet and replayed the full
    /// history into it (oldest to newest, non-blocking pushes).
    pub(crate) async fn register_outlet(
        &self,
        queue: mpsc::Sender<Arc<Entry>>,
    ) -> Result<u64, HubError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Register {
                outlet: Outlet { id, queue },
                ack: ack_tx,
            })
            .await
            .map_err(|_| HubError::Stopped)?;
        ack_rx.await.map_err(|_| HubError::Stopped)?;
        Ok(id)
    }

    pub(crate) async fn unregister_id(&self, id: u64) -> Result<(), HubError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Unregister { id, ack: ack_tx })
            .await
            .map_err(|_| HubError::Stopped)?;
        ack_rx.await.map_err(|_| HubError::Stopped)
    }

    /// A cloned command sender, for selectors to deregister themselves
    pub(crate) fn command_sender(&self) -> mpsc::Sender<Command> {
        self.tx.clone()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned exclusively by the dispatch loop task
struct DispatchLoop {
    rx: mpsc::Receiver<Command>,
    history: History,
    outlets: Vec<Outlet>,
    subscriber_count: Arc<AtomicUsize>,
    published: Arc<AtomicU64>,
}

impl DispatchLoop {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Publish(entry) => self.publish(entry),
                Command::Register { outlet, ack } => {
                    self.register(outlet);
                    let _ = ack.send(());
                }
                Command::Unregister { id, ack } => {
                    self.unregister(id);
                    let _ = ack.send(());
                }
                Command::Stop => {
                    // Shutdown unregisters everything still live.
                    self.outlets.clear();
                    self.subscriber_count.store(0, Ordering::Relaxed);
                    debug!(target: "logtap::hub", "dispatch loop stopping");
                    break;
                }
            }
        }
    }

    /// Append to the replay buffer, then fan out with non-blocking pushes
    fn publish(&mut self, entry: Arc<Entry>) {
        self.history.push(Arc::clone(&entry));
        self.published.fetch_add(1, Ordering::Relaxed);

        for outlet in &self.outlets {
            if outlet.queue.try_send(Arc::clone(&entry)).is_err() {
                // Full or abandoned queue: drop for this subscriber only.
                trace!(target: "logtap::hub", id = outlet.id, "selector queue full, entry dropped");
            }
        }
    }

    /// Add to the fan-out set and replay history into the new outlet
    fn register(&mut self, outlet: Outlet) {
        for entry in self.history.replay() {
            // A selector too slow to accept replay misses those entries;
            // registration must never block the loop.
            if outlet.queue.try_send(entry).is_err() {
                trace!(target: "logtap::hub", id = outlet.id, "replay push dropped");
            }
        }
        debug!(target: "logtap::hub", id = outlet.id, "selector registered");
        self.outlets.push(outlet);
        self.subscriber_count
            .store(self.outlets.len(), Ordering::Relaxed);
    }

    /// Remove by id; unknown ids are ignored (already removed)
    fn unregister(&mut self, id: u64) {
        self.outlets.retain(|outlet| outlet.id != id);
        self.subscriber_count
            .store(self.outlets.len(), Ordering::Relaxed);
        debug!(target: "logtap::hub", id, "selector unregistered");
    }
}
