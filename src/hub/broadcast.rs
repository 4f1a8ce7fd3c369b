//! Broadcast Hub
//!
//! Owns the registry of active subscribers and the non-blocking fan-out.
//! Every read and write of the registry goes through a single mutex, and no
//! I/O (including logging) happens while it is held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::record::Record;
use super::subscription::{SubscriberId, Subscription};

type Registry = HashMap<SubscriberId, mpsc::Sender<Record>>;

/// Configuration for the broadcast hub
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Records buffered per subscriber before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    16
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Point-in-time counters for the hub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Currently registered subscribers
    pub subscribers: usize,
    /// Records passed to `broadcast`
    pub broadcasts: u64,
    /// Successful enqueues across all subscribers
    pub delivered: u64,
    /// Records dropped because a subscriber queue was full
    pub dropped: u64,
}

/// State shared between the hub and its outstanding subscriptions
pub(super) struct Shared {
    registry: Mutex<Registry>,
    broadcasts: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            broadcasts: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // The map is never left half-mutated, so a poisoned lock is still usable
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove a subscriber, closing its queue. Returns false if it was
    /// already gone.
    pub(super) fn unregister(&self, id: &SubscriberId) -> bool {
        let sender = self.lock().remove(id);
        let removed = sender.is_some();
        // Sender dropped here, outside the lock
        drop(sender);

        if removed {
            tracing::debug!(subscriber_id = %id, "Subscriber unregistered");
        }
        removed
    }
}

/// Manages all subscribers and fans records out to them
pub struct BroadcastHub {
    shared: Arc<Shared>,
    config: HubConfig,
}

impl BroadcastHub {
    /// Create a new hub with no subscribers
    pub fn new(config: HubConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            config,
        }
    }

    /// Register a new subscriber with its own bounded queue
    ///
    /// The subscriber receives every record broadcast from now on, subject
    /// to the drop-if-full policy.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
        let id = Uuid::new_v4();

        self.shared.lock().insert(id, sender);

        tracing::debug!(subscriber_id = %id, "Subscriber registered");
        Subscription::new(id, receiver, Arc::clone(&self.shared))
    }

    /// Remove a subscriber and close its queue
    ///
    /// A reader waiting on the queue receives whatever is still buffered,
    /// then `None`. Calling this for an unknown or already removed id is a
    /// no-op that returns false.
    pub fn unregister(&self, id: &SubscriberId) -> bool {
        self.shared.unregister(id)
    }

    /// Offer a record to every registered subscriber without blocking
    ///
    /// Subscribers whose queue is full miss this record; nobody else is
    /// affected. Returns the number of subscribers the record was queued for.
    pub fn broadcast(&self, record: &Record) -> usize {
        let mut delivered = 0usize;
        let mut dropped = 0usize;

        {
            let registry = self.shared.lock();
            for sender in registry.values() {
                match sender.try_send(record.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => dropped += 1,
                    // Receiver is being dropped; its Drop removes the entry
                    Err(TrySendError::Closed(_)) => {}
                }
            }
        }

        self.shared.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.shared
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);

        if dropped > 0 {
            self.shared
                .dropped
                .fetch_add(dropped as u64, Ordering::Relaxed);
            tracing::trace!(
                delivered,
                dropped,
                "Subscriber queues full, record dropped for slow viewers"
            );
        }

        delivered
    }

    /// Close every subscriber queue and empty the registry
    ///
    /// Delivery loops see their queue end and shut down. Used on process
    /// shutdown so long-lived streams do not keep the server alive.
    pub fn close_all(&self) -> usize {
        let closed: Vec<_> = self.shared.lock().drain().collect();
        let count = closed.len();
        drop(closed);

        tracing::info!(subscribers = count, "Closed all subscriber queues");
        count
    }

    /// Current number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().len()
    }

    /// Snapshot of the hub counters
    pub fn stats(&self) -> HubStats {
        HubStats {
            subscribers: self.subscriber_count(),
            broadcasts: self.shared.broadcasts.load(Ordering::Relaxed),
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
