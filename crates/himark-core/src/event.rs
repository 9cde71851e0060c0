//! Store lifecycle events.
//!
//! The store reports what happened to the open document (opened, saved,
//! reloaded, closed, failed) on a `tokio::sync::broadcast` channel. The
//! console prints them as status lines; tests read them to check ordering.
//! The store never waits on a listener: with nobody subscribed, events are
//! dropped.

use std::path::PathBuf;

use tokio::sync::broadcast;

/// Events kept per subscriber before the oldest are dropped.
const CAPACITY: usize = 64;

/// Lifecycle events emitted by a [`FileStore`](crate::FileStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A file was loaded into the store
    Opened(PathBuf),
    /// The content was written to a file
    Saved(PathBuf),
    /// The document was closed
    Closed,
    /// The file changed on disk and the user chose to reload it
    Reloaded(PathBuf),
    /// An operation failed; the message is also in the store's error field
    Failed(String),
}

/// Sending side owned by the store.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: StoreEvent) {
        tracing::trace!("Store event: {:?}", event);
        let _ = self.sender.send(event);
    }

    /// Receiver for events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads store events, skipping over any a slow listener missed.
pub struct EventHandler {
    receiver: broadcast::Receiver<StoreEvent>,
}

impl EventHandler {
    pub fn new(receiver: broadcast::Receiver<StoreEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Status listener fell behind, skipped {} store events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(StoreEvent::Closed);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, StoreEvent::Closed);
    }

    #[tokio::test]
    async fn test_handler_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());

        bus.emit(StoreEvent::Saved(PathBuf::from("/docs/a.md")));
        drop(bus);

        assert_eq!(
            handler.next().await,
            Some(StoreEvent::Saved(PathBuf::from("/docs/a.md")))
        );
        assert_eq!(handler.next().await, None);
    }

    #[tokio::test]
    async fn test_lagging_handler_skips_to_oldest_kept_event() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());

        for i in 0..CAPACITY + 2 {
            bus.emit(StoreEvent::Failed(format!("error {i}")));
        }

        assert_eq!(
            handler.next().await,
            Some(StoreEvent::Failed("error 2".to_string()))
        );
    }
}
