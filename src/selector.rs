//! Selectors: per-subscriber filters with a bounded inbound queue
//!
//! A `Selector` is one live subscription. It owns the compiled predicate
//! for its filter expression and the receiving end of a bounded queue
//! the hub fans entries into. Consumers poll [`Selector::drain`] at
//! their own cadence; no wake-up is provided.
//!
//! # Lock discipline
//!
//! The predicate is the only state shared between the consumer's drain
//! and a concurrent `set_expression`: it sits behind a reader/writer
//! lock so many evaluations may proceed together while a replacement
//! excludes them all and swaps the whole tree at once. A drain can never
//! observe a partially updated predicate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};

use crate::entry::Entry;
use crate::error::{HubError, ParseError};
use crate::hub::{Command, Hub};
use crate::predicate::Predicate;

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;

/// Capacity of a selector's inbound entry queue
pub const QUEUE_CAPACITY: usize = 64;

/// One subscriber's live filter
#[derive(Debug)]
pub struct Selector {
    id: u64,
    hub_tx: mpsc::Sender<Command>,
    epoch: DateTime<Utc>,
    expression: RwLock<String>,
    predicate: RwLock<Predicate>,
    inbox: Mutex<mpsc::Receiver<Arc<Entry>>>,
    stopped: AtomicBool,
}

impl Selector {
    /// Compile `expression` and register with the hub
    ///
    /// The expression is validated before anything touches the hub, so a
    /// malformed expression leaves no registration behind. On success the
    /// hub has already replayed its current history into the new queue.
    pub async fn connect(expression: &str, hub: &Hub) -> Result<Self, HubError> {
        let predicate = Predicate::parse(expression)?;

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let id = hub.register_outlet(queue_tx).await?;

        Ok(Self {
            id,
            hub_tx: hub.command_sender(),
            epoch: hub.epoch(),
            expression: RwLock::new(expression.to_string()),
            predicate: RwLock::new(predicate),
            inbox: Mutex::new(queue_rx),
            stopped: AtomicBool::new(false),
        })
    }

    /// Subscriber id assigned by the hub
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The process reference timestamp, for relative entry times
    #[inline]
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// The currently installed filter expression text
    pub fn expression(&self) -> String {
        self.expression.read().clone()
    }

    /// Replace the filter expression
    ///
    /// All-or-nothing: on a parse failure the previously installed
    /// predicate remains in effect and nothing else changes. On success
    /// the new tree is swapped in atomically with respect to `drain`.
    pub fn set_expression(&self, expression: &str) -> Result<(), ParseError> {
        let compiled = Predicate::parse(expression)?;

        let mut predicate = self.predicate.write();
        *predicate = compiled;
        *self.expression.write() = expression.to_string();
        Ok(())
    }

    /// Pop queued entries until one matches the current predicate
    ///
    /// Non-blocking: returns the first matching entry, or `None` once
    /// the queue is exhausted. Non-matching entries are discarded. A
    /// stopped selector returns `None` without touching the queue.
    pub fn drain(&self) -> Option<Arc<Entry>> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }

        let mut inbox = self.inbox.lock();
        while let Ok(entry) = inbox.try_recv() {
            if self.predicate.read().matches(&entry) {
                return Some(entry);
            }
        }
        None
    }

    /// Deregister from the hub and mark this selector dead
    ///
    /// Safe to call repeatedly; only the first call deregisters.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .hub_tx
            .send(Command::Unregister {
                id: self.id,
                ack: ack_tx,
            })
            .await
            .is_ok()
        {
            // Hub already stopped is fine; nothing left to deliver anyway.
            let _ = ack_rx.await;
        }
    }

    /// Whether `stop` has been called
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
