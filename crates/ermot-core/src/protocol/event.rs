//! Host → controller events.
//!
//! Serialised as `{"event": "<name>", "payload": {...}}`, the same envelope
//! shape controllers use for commands.

use serde::Serialize;

use crate::protocol::result::ActionResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum ControllerEvent {
    /// Current system volume; unicast on connect and `query-volume`,
    /// broadcast when the watcher sees a change.
    #[serde(rename = "volumeActuel")]
    Volume { data: u8 },
    #[serde(rename = "mouse-result")]
    MouseResult(ActionResult),
    #[serde(rename = "keyboard-result")]
    KeyboardResult(ActionResult),
    #[serde(rename = "keyboard-clipboard-result")]
    ClipboardText { text: String },
    #[serde(rename = "media-result")]
    MediaResult(ActionResult),
    #[serde(rename = "system-result")]
    SystemResult(ActionResult),
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Volume { .. } => "volumeActuel",
            Self::MouseResult(_) => "mouse-result",
            Self::KeyboardResult(_) => "keyboard-result",
            Self::ClipboardText { .. } => "keyboard-clipboard-result",
            Self::MediaResult(_) => "media-result",
            Self::SystemResult(_) => "system-result",
        }
    }

    /// Serialises the event into a text frame body.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
