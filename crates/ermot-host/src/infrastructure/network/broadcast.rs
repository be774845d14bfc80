//! Fan-out of controller events.
//!
//! Every controller session subscribes to one `tokio::sync::broadcast`
//! channel; the subscription lives exactly as long as the connection, so the
//! receiver count doubles as the table of connected controllers.  A session
//! that falls more than [`BROADCAST_CAPACITY`] events behind skips the
//! oldest ones (volume levels, so only the latest matters).

use tokio::sync::broadcast;
use tracing::debug;

use ermot_core::ControllerEvent;

use crate::application::notify::ControllerBroadcast;

pub const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ControllerBroadcaster {
    tx: broadcast::Sender<ControllerEvent>,
}

impl ControllerBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Registers a controller session.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.tx.subscribe()
    }

    /// Number of controllers currently connected.
    pub fn controller_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ControllerBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBroadcast for ControllerBroadcaster {
    fn broadcast(&self, event: ControllerEvent) {
        match self.tx.send(event) {
            Ok(n) => debug!("Broadcast to {n} controller(s)"),
            Err(_) => debug!("Broadcast skipped: no controllers connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives_the_event() {
        // Arrange
        let broadcaster = ControllerBroadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        // Act
        broadcaster.broadcast(ControllerEvent::Volume { data: 30 });

        // Assert
        assert_eq!(first.recv().await.unwrap(), ControllerEvent::Volume { data: 30 });
        assert_eq!(second.recv().await.unwrap(), ControllerEvent::Volume { data: 30 });
    }

    #[test]
    fn test_broadcast_without_controllers_is_harmless() {
        let broadcaster = ControllerBroadcaster::new();
        broadcaster.broadcast(ControllerEvent::Volume { data: 30 });
        assert_eq!(broadcaster.controller_count(), 0);
    }

    #[test]
    fn test_dropped_subscription_leaves_the_table() {
        let broadcaster = ControllerBroadcaster::new();
        let rx = broadcaster.subscribe();
        assert_eq!(broadcaster.controller_count(), 1);

        drop(rx);

        assert_eq!(broadcaster.controller_count(), 0);
    }
}
