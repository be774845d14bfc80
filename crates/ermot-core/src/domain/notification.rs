//! Notifications pushed from the host process to its window.
//!
//! These are one-way and host-internal; controllers never see them.  Each
//! variant serialises as `{"channel": "...", "payload": {...}}` so a UI can
//! route on the channel name.

use serde::{Deserialize, Serialize};

use crate::domain::connection::ConnectionInfo;
use crate::protocol::command::MouseButton;

/// Which part of the host a status line is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Server,
    Socket,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Orange,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusState {
    #[serde(rename = "type")]
    pub component: Component,
    pub color: StatusColor,
    /// Controller connection id, for `client` updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: StatusState,
    pub message: String,
}

/// Live pointer echo shown on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PointerEcho {
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseClick {
        button: MouseButton,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        double: bool,
        x: i32,
        y: i32,
    },
}

/// Pairing payload as displayed by the host window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingDisplay {
    /// `data:` URL of the rendered QR image.
    pub qr_code: String,
    pub info: ConnectionInfo,
    pub mobile_url: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileServerStatus {
    pub url: String,
    pub port: u16,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum HostNotification {
    State(StatusUpdate),
    Volume { data: u8 },
    Mouse(PointerEcho),
    #[serde(rename = "qrcode")]
    QrCode(PairingDisplay),
    MobileServer(MobileServerStatus),
}

impl HostNotification {
    pub fn status(component: Component, color: StatusColor, message: impl Into<String>) -> Self {
        Self::State(StatusUpdate {
            state: StatusState {
                component,
                color,
                socket: None,
            },
            message: message.into(),
        })
    }

    /// `client` status carrying the controller connection id.
    pub fn client_status(
        connection_id: impl Into<String>,
        color: StatusColor,
        message: impl Into<String>,
    ) -> Self {
        Self::State(StatusUpdate {
            state: StatusState {
                component: Component::Client,
                color,
                socket: Some(connection_id.into()),
            },
            message: message.into(),
        })
    }

    pub fn volume(level: u8) -> Self {
        Self::Volume { data: level }
    }

    pub fn mobile_server_running(url: impl Into<String>, port: u16) -> Self {
        Self::MobileServer(MobileServerStatus {
            url: url.into(),
            port,
            status: "running".to_string(),
        })
    }

    /// Channel name, for logging.
    pub fn channel(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::Volume { .. } => "volume",
            Self::Mouse(_) => "mouse",
            Self::QrCode(_) => "qrcode",
            Self::MobileServer(_) => "mobile-server",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
