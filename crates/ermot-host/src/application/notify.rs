//! Outbound ports: the host window and the set of connected controllers.

use ermot_core::domain::notification::HostNotification;
use ermot_core::ControllerEvent;

/// Receives push notifications destined for the host window.
///
/// Implementations must not block; a notification that cannot be delivered
/// is dropped.
pub trait HostNotifier: Send + Sync {
    fn notify(&self, notification: HostNotification);

    /// Whether a window is currently listening.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Sends an event to every connected controller.
pub trait ControllerBroadcast: Send + Sync {
    fn broadcast(&self, event: ControllerEvent);
}
