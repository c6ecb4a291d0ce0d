//! Fan-out of [`StoreEvent`]s to WebSocket connections.
//!
//! The sync store publishes one event per cache mutation or recorded
//! failure. Each connection holds a [`StoreEvents`] stream and filters it
//! against its own shop subscriptions.

use tokio::sync::broadcast;

use super::StoreEvent;

/// Broadcast bus for [`StoreEvent`]s.
///
/// Publishing never blocks the store. When the ring buffer is full the
/// oldest events are dropped for lagging streams.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per stream.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Hands `event` to every open stream.
    ///
    /// Events published while no connection is open are dropped.
    pub fn publish(&self, event: StoreEvent) {
        let event_type = event.event_type_str();
        let shop_id = event.shop_id();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(
            event_type,
            shop_id = ?shop_id.map(|id| id.to_string()),
            delivered,
            "store event published"
        );
    }

    /// Opens a stream of the events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> StoreEvents {
        StoreEvents {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    /// Number of open streams.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One subscriber's view of the bus.
#[derive(Debug)]
pub struct StoreEvents {
    receiver: broadcast::Receiver<StoreEvent>,
    missed: u64,
}

impl StoreEvents {
    /// Waits for the next event.
    ///
    /// Events overwritten before this stream read them are skipped and
    /// counted in [`Self::missed`]. Returns `None` once every
    /// [`EventBus`] handle is gone.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.missed += n;
                    tracing::warn!(lagged = n, "event stream fell behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Total events skipped because this stream lagged.
    #[must_use]
    pub const fn missed(&self) -> u64 {
        self.missed
    }
}
