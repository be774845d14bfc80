//! PairingPublisher: builds the pairing payload and pushes it to the host UI.
//!
//! # Flow
//!
//! ```text
//! ConnectionInfoSource ──► server URL ──► mobile URL (payload)
//!                                               │
//!                                    QrEncoder::encode
//!                                               │
//!                              SessionStore::create_session ──► code
//!                                               │
//!                (after publish_delay) HostNotifier::notify(qrcode)
//! ```
//!
//! The payload is exactly the mobile URL.  The session code travels beside
//! it for manual entry and is not embedded in the QR image.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use thiserror::Error;
use tracing::{error, info, warn};

use ermot_core::domain::connection::ConnectionInfo;
use ermot_core::domain::notification::{HostNotification, PairingDisplay};
use ermot_core::domain::pairing::{build_mobile_url, Pairing, QrOptions, Scheme};

use crate::application::notify::HostNotifier;
use crate::application::sessions::SharedSessions;

/// Supplies the host's reachable address for the command channel.
pub trait ConnectionInfoSource: Send + Sync {
    fn connection_info(&self) -> ConnectionInfo;
}

#[derive(Debug, Error)]
pub enum QrEncodeError {
    #[error("payload of {0} bytes does not fit in a QR code")]
    DataTooLong(usize),

    #[error("invalid rendering option: {0}")]
    InvalidOption(String),
}

/// Renders text as a scannable image.
#[cfg_attr(test, mockall::automock)]
pub trait QrEncoder: Send + Sync {
    /// Returns the encoded image bytes.
    fn encode(&self, text: &str, options: &QrOptions) -> Result<Vec<u8>, QrEncodeError>;

    /// MIME type of the bytes `encode` returns.
    fn media_type(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum PairingGenerationError {
    #[error("failed to render pairing QR code: {0}")]
    Encode(#[from] QrEncodeError),
}

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PairingSettings {
    pub scheme: Scheme,
    pub entry_document: String,
    pub qr: QrOptions,
    /// How long `publish` waits before pushing to the host UI.
    pub publish_delay: Duration,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            entry_document: "mobile-client.html".to_string(),
            qr: QrOptions::default(),
            publish_delay: Duration::from_millis(800),
        }
    }
}

/// A generated pairing plus its rendered image as a `data:` URL.
#[derive(Debug, Clone)]
pub struct RenderedPairing {
    pub pairing: Pairing,
    pub image_data_url: String,
}

impl RenderedPairing {
    pub fn to_display(&self) -> PairingDisplay {
        PairingDisplay {
            qr_code: self.image_data_url.clone(),
            info: self.pairing.connection_info.clone(),
            mobile_url: self.pairing.mobile_url.clone(),
            code: self.pairing.code.clone(),
        }
    }
}

pub struct PairingPublisher {
    resolver: Arc<dyn ConnectionInfoSource>,
    encoder: Arc<dyn QrEncoder>,
    sessions: SharedSessions,
    settings: PairingSettings,
}

impl PairingPublisher {
    pub fn new(
        resolver: Arc<dyn ConnectionInfoSource>,
        encoder: Arc<dyn QrEncoder>,
        sessions: SharedSessions,
        settings: PairingSettings,
    ) -> Self {
        Self {
            resolver,
            encoder,
            sessions,
            settings,
        }
    }

    /// Builds the payload, renders it, and records a session for it.
    ///
    /// No session is created when rendering fails.
    pub async fn generate_pairing(
        &self,
        mobile_port: u16,
    ) -> Result<RenderedPairing, PairingGenerationError> {
        let connection_info = self.resolver.connection_info();
        let server_url = connection_info.url.clone();
        let mobile_url = build_mobile_url(
            self.settings.scheme,
            &connection_info.ip,
            mobile_port,
            &self.settings.entry_document,
            &server_url,
        );

        let image = self.encoder.encode(&mobile_url, &self.settings.qr)?;
        let image_data_url = format!(
            "data:{};base64,{}",
            self.encoder.media_type(),
            base64::engine::general_purpose::STANDARD.encode(image)
        );

        let code = self
            .sessions
            .lock()
            .await
            .create_session(&server_url, &mobile_url);

        Ok(RenderedPairing {
            pairing: Pairing {
                payload: mobile_url.clone(),
                code,
                mobile_url,
                server_url,
                connection_info,
            },
            image_data_url,
        })
    }

    /// Generates a pairing and, after the configured delay, pushes it to the
    /// host UI.  Never fails: errors are logged and `None` is returned.
    pub async fn publish(&self, notifier: &dyn HostNotifier, mobile_port: u16) -> Option<Pairing> {
        let rendered = match self.generate_pairing(mobile_port).await {
            Ok(rendered) => rendered,
            Err(e) => {
                error!("Pairing: {e}");
                return None;
            }
        };

        tokio::time::sleep(self.settings.publish_delay).await;

        if !notifier.is_attached() {
            warn!("Pairing: host window not attached; pairing code not displayed");
            return None;
        }
        notifier.notify(HostNotification::QrCode(rendered.to_display()));
        info!(
            "Pairing published: code {} for {}",
            rendered.pairing.code, rendered.pairing.mobile_url
        );
        Some(rendered.pairing)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
