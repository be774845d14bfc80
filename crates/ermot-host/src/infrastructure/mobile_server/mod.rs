//! Auxiliary HTTP server for the mobile controller page.
//!
//! # Routes
//!
//! | Route                     | Response                                              |
//! |---------------------------|-------------------------------------------------------|
//! | `GET /api/resolve?code=…` | `{"success": true, "serverUrl": "...", "code": "DIRECT"}` |
//! | anything else             | static file below the root directory (see `static_files`) |
//!
//! `/api/resolve` answers every request the same way, whatever `code` is:
//! the session code is not checked against the session store.
//!
//! # TLS
//!
//! With `use_https` on and a loadable key/certificate pair, connections are
//! accepted through `tokio-rustls` and served by `hyper-util`.  Otherwise the
//! router runs on plain HTTP through `axum::serve`.

pub mod static_files;
pub mod tls;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use hyper_util::service::TowerToHyperService;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

use ermot_core::domain::notification::HostNotification;

use crate::application::notify::HostNotifier;

/// Delay before the host window is told the mobile server is running.
pub const ANNOUNCE_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Error)]
pub enum MobileServerError {
    #[error("failed to bind mobile server on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("mobile server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// State shared by the handlers.
#[derive(Debug, Clone)]
pub struct MobileState {
    pub root_dir: Arc<PathBuf>,
    pub entry_document: Arc<str>,
    /// Command channel URL handed out by `/api/resolve`.
    pub server_url: Arc<str>,
}

impl MobileState {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        entry_document: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            root_dir: Arc::new(root_dir.into()),
            entry_document: Arc::from(entry_document.into()),
            server_url: Arc::from(server_url.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub success: bool,
    pub server_url: String,
    pub code: &'static str,
}

/// Builds the router.
pub fn router(state: MobileState) -> Router {
    Router::new()
        .route("/api/resolve", get(resolve))
        .fallback(static_files::serve_static)
        .with_state(state)
}

/// Pairing resolution.  Always succeeds and always answers `DIRECT`.
async fn resolve(
    State(state): State<MobileState>,
    Query(query): Query<ResolveQuery>,
) -> impl IntoResponse {
    debug!("Mobile server: resolve requested for code {:?}", query.code);
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(ResolveResponse {
            success: true,
            server_url: state.server_url.to_string(),
            code: "DIRECT",
        }),
    )
}

// ── Serving ───────────────────────────────────────────────────────────────────

/// Binds the mobile server on all interfaces.
///
/// # Errors
///
/// Returns [`MobileServerError::Bind`] if the port is taken.
pub async fn bind_mobile_server(port: u16) -> Result<TcpListener, MobileServerError> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|source| MobileServerError::Bind { port, source })?;
    info!("Mobile server listening on port {port}");
    Ok(listener)
}

/// Serves `router` on `listener` until `running` is cleared.
///
/// # Errors
///
/// Returns [`MobileServerError::Serve`] if the plain-HTTP server fails.
pub async fn serve_mobile_server(
    listener: TcpListener,
    router: Router,
    tls: Option<TlsAcceptor>,
    running: Arc<AtomicBool>,
) -> Result<(), MobileServerError> {
    match tls {
        None => axum::serve(listener, router)
            .with_graceful_shutdown(wait_for_shutdown(running))
            .await
            .map_err(MobileServerError::Serve),
        Some(acceptor) => {
            serve_tls(listener, router, acceptor, running).await;
            Ok(())
        }
    }
}

/// Accept loop for HTTPS: one task per connection doing the TLS handshake
/// and then HTTP/1 or HTTP/2 through `hyper-util`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    acceptor: TlsAcceptor,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        let (stream, peer_addr) = match timeout(Duration::from_millis(200), listener.accept()).await
        {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                error!("Mobile server: accept error: {e}");
                continue;
            }
            Err(_) => continue,
        };

        let acceptor = acceptor.clone();
        let service = TowerToHyperService::new(router.clone());
        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(tls_stream) => tls_stream,
                Err(e) => {
                    debug!("Mobile server: TLS handshake with {peer_addr} failed: {e}");
                    return;
                }
            };
            if let Err(e) = ConnectionBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(tls_stream), service)
                .await
            {
                debug!("Mobile server: connection {peer_addr} ended: {e}");
            }
        });
    }
    info!("Mobile server: shutdown flag set; stopping");
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// Tells the host window where the mobile page is, after [`ANNOUNCE_DELAY`].
pub async fn announce(notifier: Arc<dyn HostNotifier>, url: String, port: u16) {
    tokio::time::sleep(ANNOUNCE_DELAY).await;
    if !notifier.is_attached() {
        warn!("Mobile server: host window not attached; address not displayed");
    }
    notifier.notify(HostNotification::mobile_server_running(url, port));
}

// ── Tests ─────────────────────────────────────────────────────────────────────
