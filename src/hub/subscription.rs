//! Subscriber handle
//!
//! A [`Subscription`] is the receiving end of one viewer's bounded queue.
//! It stays in the hub registry exactly as long as the handle is alive.

use std::sync::Arc;

use futures_util::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::broadcast::Shared;
use super::record::Record;

/// Unique identifier for a registered subscriber
pub type SubscriberId = Uuid;

/// Handle for receiving records broadcast by the hub
///
/// Dropping the handle removes it from the registry, so every exit path of a
/// delivery loop (clean close, write failure, panic unwind) unregisters once.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Record>,
    shared: Arc<Shared>,
}

impl Subscription {
    pub(super) fn new(id: SubscriberId, receiver: mpsc::Receiver<Record>, shared: Arc<Shared>) -> Self {
        Self {
            id,
            receiver,
            shared,
        }
    }

    /// Identifier used by the hub registry
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next record
    ///
    /// Returns `None` once the hub has closed this queue (unregister or
    /// shutdown) and every record already queued has been received.
    pub async fn recv(&mut self) -> Option<Record> {
        self.receiver.recv().await
    }

    /// Take the next queued record without waiting
    pub fn try_recv(&mut self) -> Option<Record> {
        self.receiver.try_recv().ok()
    }

    /// Convert into a stream of records that unregisters when dropped
    pub fn into_stream(self) -> impl Stream<Item = Record> + Send + 'static {
        futures_util::stream::unfold(self, |mut subscription| async move {
            let record = subscription.recv().await?;
            Some((record, subscription))
        })
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.unregister(&self.id);
    }
}
