//! Command dispatch: one decoded command in, at most one reply out.
//!
//! # Routing (for beginners)
//!
//! | Command                     | Reply to the sender          | Host UI echo      |
//! |-----------------------------|------------------------------|-------------------|
//! | `query-volume`              | `volumeActuel`               | –                 |
//! | `set-volume`                | none                         | `volume`          |
//! | `mouse-move`                | `mouse-result`               | `mouse` on success|
//! | `mouse-click/double-click`  | `mouse-result`               | `mouse` always*   |
//! | `keyboard-type/key/shortcut`| `keyboard-result`            | –                 |
//! | `keyboard-get-clipboard`    | `keyboard-clipboard-result`  | –                 |
//! | `media-*`                   | `media-result`               | –                 |
//! | `system-*`                  | `system-result`              | –                 |
//!
//! \* Clicks are echoed even when they fail, as long as the pointer
//! position can be read.
//!
//! Replies never go to other controllers.  Other controllers learn about a
//! volume change through the [`VolumeWatcher`](crate::application::volume::VolumeWatcher)
//! broadcast once the OS reports the new level.

use std::sync::Arc;

use tracing::{debug, warn};

use ermot_core::domain::notification::{HostNotification, PointerEcho};
use ermot_core::domain::volume::VolumeLimits;
use ermot_core::protocol::command::{ControllerCommand, MouseButton};
use ermot_core::protocol::event::ControllerEvent;
use ermot_core::protocol::keys::ShortcutAction;

use crate::application::host_actions::HostActionGateway;
use crate::application::notify::HostNotifier;
use crate::application::volume::VolumeControl;

/// Executes controller commands against the host.
pub struct CommandDispatcher {
    gateway: Arc<HostActionGateway>,
    volume: Arc<dyn VolumeControl>,
    notifier: Arc<dyn HostNotifier>,
    limits: VolumeLimits,
}

impl CommandDispatcher {
    pub fn new(
        gateway: Arc<HostActionGateway>,
        volume: Arc<dyn VolumeControl>,
        notifier: Arc<dyn HostNotifier>,
        limits: VolumeLimits,
    ) -> Self {
        Self {
            gateway,
            volume,
            notifier,
            limits,
        }
    }

    /// Current system volume as a `volumeActuel` event, or `None` if the OS
    /// query failed.
    pub async fn current_volume(&self) -> Option<ControllerEvent> {
        match self.volume.get_volume().await {
            Ok(level) => Some(ControllerEvent::Volume { data: level }),
            Err(e) => {
                warn!("Command channel: volume read failed: {e}");
                None
            }
        }
    }

    /// Runs `command` and returns the reply for the issuing controller.
    pub async fn dispatch(&self, command: ControllerCommand) -> Option<ControllerEvent> {
        match command {
            ControllerCommand::QueryVolume => self.current_volume().await,
            ControllerCommand::SetVolume { requested } => {
                self.set_volume(requested).await;
                None
            }

            ControllerCommand::MouseMove { dx, dy } => {
                let result = self.gateway.move_pointer(dx, dy).await;
                if let Some(position) = result.position() {
                    self.notifier.notify(HostNotification::Mouse(PointerEcho::MouseMove {
                        x: position.x,
                        y: position.y,
                    }));
                }
                Some(ControllerEvent::MouseResult(result))
            }
            ControllerCommand::MouseClick { button } => {
                let result = self.gateway.click(button).await;
                self.echo_click(button, false).await;
                Some(ControllerEvent::MouseResult(result))
            }
            ControllerCommand::MouseDoubleClick => {
                let result = self.gateway.double_click().await;
                self.echo_click(MouseButton::Left, true).await;
                Some(ControllerEvent::MouseResult(result))
            }

            ControllerCommand::KeyboardType { text } => Some(ControllerEvent::KeyboardResult(
                self.gateway.type_text(&text).await,
            )),
            ControllerCommand::KeyboardKey { key, modifiers } => Some(
                ControllerEvent::KeyboardResult(self.gateway.press_key(&key, &modifiers).await),
            ),
            ControllerCommand::KeyboardShortcut { action } => {
                let Some(shortcut) = ShortcutAction::from_name(&action) else {
                    debug!("Command channel: ignoring unknown shortcut {action:?}");
                    return None;
                };
                Some(ControllerEvent::KeyboardResult(
                    self.gateway.shortcut(shortcut).await,
                ))
            }
            ControllerCommand::KeyboardGetClipboard => Some(ControllerEvent::ClipboardText {
                text: self.gateway.clipboard_text().await,
            }),

            ControllerCommand::Media(action) => {
                Some(ControllerEvent::MediaResult(self.gateway.media(action).await))
            }
            ControllerCommand::System(action) => {
                Some(ControllerEvent::SystemResult(self.gateway.system(action)))
            }
        }
    }

    async fn set_volume(&self, requested: f64) {
        let Some(level) = self.limits.clamp(requested) else {
            warn!("Command channel: dropping set-volume with invalid level {requested}");
            return;
        };
        match self.volume.set_volume(level).await {
            Ok(()) => {
                debug!("Command channel: volume set to {level}");
                self.notifier.notify(HostNotification::volume(level));
            }
            Err(e) => warn!("Command channel: set-volume {level} failed: {e}"),
        }
    }

    /// Mirrors a click to the host window at the current pointer position,
    /// whether or not the click itself went through.
    async fn echo_click(&self, button: MouseButton, double: bool) {
        if let Some(position) = self.gateway.pointer_position().await {
            self.notifier.notify(HostNotification::Mouse(PointerEcho::MouseClick {
                button,
                double,
                x: position.x,
                y: position.y,
            }));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
