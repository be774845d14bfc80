//! Bridge between the host services and the host window.
//!
//! The services push [`HostNotification`]s through the [`HostNotifier`]
//! port; `UiBridge` is its implementation.  Notifications are published on a
//! `tokio::sync::broadcast` channel that any window front end subscribes to:
//!
//! ```text
//! CommandDispatcher ─┐
//! VolumeWatcher ─────┼─► UiBridge ──broadcast──► window front end(s)
//! PairingPublisher ──┘                      └──► console log window
//! ```
//!
//! A notification published while nobody is subscribed is dropped; that is
//! also how [`HostNotifier::is_attached`] is answered.
//!
//! The bundled binary has no graphical window, so it subscribes
//! [`spawn_console_window`], which writes each notification to the log.
//!
//! # JSON shape
//!
//! Front ends that live outside the process (a WebView, an IPC client)
//! receive the notification serialised as
//! `{"channel": "<state|volume|mouse|qrcode|mobile-server>", "payload": {...}}`.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use ermot_core::domain::notification::{HostNotification, PointerEcho, StatusColor};

use crate::application::background::BackgroundTask;
use crate::application::notify::HostNotifier;

const CAPACITY: usize = 128;

#[derive(Debug, Clone)]
pub struct UiBridge {
    tx: broadcast::Sender<HostNotification>,
}

impl UiBridge {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Attaches a window.
    pub fn subscribe(&self) -> broadcast::Receiver<HostNotification> {
        self.tx.subscribe()
    }
}

impl Default for UiBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HostNotifier for UiBridge {
    fn notify(&self, notification: HostNotification) {
        let channel = notification.channel();
        if self.tx.send(notification).is_err() {
            debug!("Host window not attached; dropped {channel} notification");
        }
    }

    fn is_attached(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

/// Subscribes a stand-in window that logs every notification.
pub fn spawn_console_window(bridge: &UiBridge) -> BackgroundTask {
    let mut rx = bridge.subscribe();
    let handle = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => log_notification(&notification),
                Err(RecvError::Lagged(n)) => warn!("Console window skipped {n} notification(s)"),
                Err(RecvError::Closed) => break,
            }
        }
    });
    BackgroundTask::new("console-window", handle)
}

fn log_notification(notification: &HostNotification) {
    match notification {
        HostNotification::State(update) => match update.state.color {
            StatusColor::Red => warn!("[{:?}] {}", update.state.component, update.message),
            _ => info!("[{:?}] {}", update.state.component, update.message),
        },
        HostNotification::Volume { data } => debug!("[volume] {data}"),
        HostNotification::Mouse(PointerEcho::MouseMove { x, y }) => {
            debug!("[mouse] move to ({x}, {y})")
        }
        HostNotification::Mouse(PointerEcho::MouseClick { button, double, x, y }) => {
            debug!("[mouse] {} click (double: {double}) at ({x}, {y})", button.as_str())
        }
        HostNotification::QrCode(pairing) => info!(
            "[pairing] open {} on the phone or enter code {}",
            pairing.mobile_url, pairing.code
        ),
        HostNotification::MobileServer(status) => {
            info!("[mobile-server] {} at {}", status.status, status.url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ermot_core::domain::notification::Component;

    #[test]
    fn test_bridge_is_detached_until_subscribed() {
        let bridge = UiBridge::new();
        assert!(!bridge.is_attached());

        let _rx = bridge.subscribe();

        assert!(bridge.is_attached());
    }

    #[tokio::test]
    async fn test_subscribed_window_receives_notifications() {
        // Arrange
        let bridge = UiBridge::new();
        let mut rx = bridge.subscribe();

        // Act
        bridge.notify(HostNotification::status(
            Component::Server,
            StatusColor::Green,
            "Application started",
        ));

        // Assert
        let received = rx.recv().await.unwrap();
        assert_eq!(received.channel(), "state");
    }

    #[test]
    fn test_console_log_covers_every_notification_channel() {
        use ermot_core::domain::connection::ConnectionInfo;
        use ermot_core::domain::notification::PairingDisplay;

        let notifications = [
            HostNotification::status(Component::Socket, StatusColor::Red, "bind failed"),
            HostNotification::volume(30),
            HostNotification::Mouse(PointerEcho::MouseMove { x: 1, y: 2 }),
            HostNotification::QrCode(PairingDisplay {
                qr_code: "data:image/svg+xml;base64,".to_string(),
                info: ConnectionInfo::new("192.168.1.42", 9000, "desk"),
                mobile_url: "http://192.168.1.42:8080/mobile-client.html".to_string(),
                code: "A1B2C3".to_string(),
            }),
            HostNotification::mobile_server_running("http://192.168.1.42:8080", 8080),
        ];

        for notification in &notifications {
            log_notification(notification);
        }
    }

    #[test]
    fn test_notify_without_window_is_dropped_quietly() {
        let bridge = UiBridge::new();
        bridge.notify(HostNotification::volume(10));
    }
}
