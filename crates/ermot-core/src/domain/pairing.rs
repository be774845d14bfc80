//! Pairing payload composition.
//!
//! The QR code shown on the host encodes a single URL: the mobile entry page
//! served by the host's auxiliary HTTP server, with the command-channel URL
//! passed as a `server` query parameter.

use serde::{Deserialize, Serialize};

use crate::domain::connection::ConnectionInfo;

/// Scheme of the auxiliary HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn from_tls(tls: bool) -> Self {
        if tls {
            Self::Https
        } else {
            Self::Http
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Builds `<scheme>://<ip>:<port>/<entry>?server=<escaped server_url>`.
pub fn build_mobile_url(
    scheme: Scheme,
    ip: &str,
    mobile_port: u16,
    entry_document: &str,
    server_url: &str,
) -> String {
    format!(
        "{}://{ip}:{mobile_port}/{}?server={}",
        scheme.as_str(),
        entry_document.trim_start_matches('/'),
        urlencoding::encode(server_url)
    )
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    High,
}

/// Rendering parameters handed to the QR encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrOptions {
    /// Output width and height in pixels.
    pub size: u32,
    /// Quiet zone, in modules.
    pub margin: u32,
    pub error_correction: ErrorCorrection,
    pub dark: String,
    pub light: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 400,
            margin: 2,
            error_correction: ErrorCorrection::Medium,
            dark: "#000000".to_string(),
            light: "#FFFFFF".to_string(),
        }
    }
}

/// Result of generating a pairing: the payload plus what the UI displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    /// Exactly the text encoded into the QR image.
    pub payload: String,
    pub code: String,
    pub mobile_url: String,
    pub server_url: String,
    pub connection_info: ConnectionInfo,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
