//! Command channel: WebSocket accept loop and per-controller sessions.
//!
//! This module is responsible for:
//!
//! 1. Binding the TCP listener on the configured address and port.
//! 2. Accepting connections from controllers and upgrading them to
//!    WebSocket, rejecting browsers whose `Origin` is not allowed.
//! 3. Running one task per controller that
//!    - tells the host window a client connected,
//!    - sends that controller the current volume,
//!    - decodes each text frame into a command and dispatches it,
//!    - replies to that controller only, and
//!    - forwards broadcast events (volume changes) to it.
//! 4. Stopping the accept loop when the `running` flag is cleared.
//!
//! # Frame format
//!
//! ```text
//! controller → host   {"event": "mouse-move", "payload": {"x": 10, "y": -5}}
//! host → controller   {"event": "mouse-result", "payload": {"success": true, "position": {...}}}
//! ```
//!
//! # Ordering
//!
//! A session handles its frames one after another: the next frame is read
//! only once the previous command has finished.  Sessions run on separate
//! tasks, so commands from different controllers interleave freely at
//! `.await` points.  Broadcast events queue while a command is running and
//! are sent right after it.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ermot_core::domain::notification::{HostNotification, StatusColor};
use ermot_core::protocol::command::{parse_frame, CommandDecodeError};
use ermot_core::ControllerEvent;

use crate::application::dispatch::CommandDispatcher;
use crate::application::notify::HostNotifier;
use crate::infrastructure::network::broadcast::ControllerBroadcaster;

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;

/// Error type for starting the command channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to bind command channel on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Origin policy ─────────────────────────────────────────────────────────────

/// Which browser origins may open the command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// `cors_origin = "*"`: any origin.
    Any,
    /// Exactly this origin.  Clients that send no `Origin` header (native
    /// apps, scripts) are still accepted.
    Exact(String),
}

impl OriginPolicy {
    pub fn from_config(value: &str) -> Self {
        match value.trim() {
            "*" | "" => Self::Any,
            origin => Self::Exact(origin.trim_end_matches('/').to_string()),
        }
    }

    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (Self::Any, _) | (_, None) => true,
            (Self::Exact(allowed), Some(origin)) => {
                origin.trim_end_matches('/').eq_ignore_ascii_case(allowed)
            }
        }
    }
}

// ── Shared state ──────────────────────────────────────────────────────────────

/// Everything a controller session needs, shared by all sessions.
pub struct ChannelContext {
    dispatcher: Arc<CommandDispatcher>,
    notifier: Arc<dyn HostNotifier>,
    broadcaster: ControllerBroadcaster,
    origin: OriginPolicy,
}

impl ChannelContext {
    pub fn new(
        dispatcher: Arc<CommandDispatcher>,
        notifier: Arc<dyn HostNotifier>,
        broadcaster: ControllerBroadcaster,
        origin: OriginPolicy,
    ) -> Self {
        Self {
            dispatcher,
            notifier,
            broadcaster,
            origin,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the command channel listener.
///
/// # Errors
///
/// Returns [`ChannelError::Bind`] if the port is in use or the address is
/// invalid.  Callers report this to the host window and carry on without a
/// command channel.
pub async fn bind_command_channel(host: &str, port: u16) -> Result<TcpListener, ChannelError> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ChannelError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Command channel listening on {addr}");
    Ok(listener)
}

/// Runs the accept loop until `running` is set to `false`.
///
/// Each accepted connection is handed to its own task so one slow
/// controller never blocks the others.
pub async fn run_command_channel(
    listener: TcpListener,
    ctx: Arc<ChannelContext>,
    running: Arc<AtomicBool>,
) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("Command channel: shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the loop notices the shutdown flag.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("Command channel: TCP connection from {peer_addr}");
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    handle_controller(stream, peer_addr, ctx).await;
                });
            }
            Ok(Err(e)) => {
                error!("Command channel: accept error: {e}");
            }
            Err(_) => {}
        }
    }
}

// ── Per-controller session ────────────────────────────────────────────────────

/// Runs [`run_session`] and logs how it ended.
async fn handle_controller(stream: TcpStream, peer_addr: SocketAddr, ctx: Arc<ChannelContext>) {
    match run_session(stream, peer_addr, ctx).await {
        Ok(id) => info!("Controller {id} ({peer_addr}) disconnected"),
        Err(e) => warn!("Controller session {peer_addr} ended with error: {e:#}"),
    }
}

/// Runs one controller connection from handshake to close.  Returns the
/// connection id.
async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<ChannelContext>,
) -> anyhow::Result<Uuid> {
    let policy = ctx.origin.clone();
    let ws_stream = accept_hdr_async(stream, move |req: &Request, resp: Response| {
        check_origin(&policy, req, resp)
    })
    .await
    .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let id = Uuid::new_v4();
    info!("Controller {id} connected from {peer_addr}");
    ctx.notifier.notify(HostNotification::client_status(
        id.to_string(),
        StatusColor::Green,
        "Client connected",
    ));

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut events = ctx.broadcaster.subscribe();

    // Point-to-point volume snapshot for the newcomer.
    if let Some(volume) = ctx.dispatcher.current_volume().await {
        send_event(&mut ws_tx, &volume).await?;
    }

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                let msg = match frame {
                    Some(Ok(msg)) => msg,
                    Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) | None => {
                        debug!("Controller {id}: stream closed");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Controller {id}: WebSocket error: {e}");
                        break;
                    }
                };

                match msg {
                    WsMessage::Text(text) => {
                        if let Some(reply) = handle_frame(&ctx, id, &text).await {
                            send_event(&mut ws_tx, &reply).await?;
                        }
                    }
                    WsMessage::Binary(_) => {
                        warn!("Controller {id}: unexpected binary frame (ignored)");
                    }
                    WsMessage::Close(_) => {
                        debug!("Controller {id}: Close frame received");
                        break;
                    }
                    // tungstenite answers pings while the sink is flushed.
                    WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
                }
            }

            event = events.recv() => match event {
                Ok(event) => send_event(&mut ws_tx, &event).await?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Controller {id}: skipped {skipped} broadcast event(s)");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(id)
}

/// Decodes and dispatches one text frame.  Invalid frames are logged and
/// produce no reply.
async fn handle_frame(ctx: &ChannelContext, id: Uuid, text: &str) -> Option<ControllerEvent> {
    let command = match parse_frame(text) {
        Ok(command) => command,
        Err(CommandDecodeError::UnknownEvent(name)) => {
            debug!("Controller {id}: ignoring unknown event {name:?}");
            return None;
        }
        Err(e) => {
            warn!("Controller {id}: dropping frame: {e}");
            return None;
        }
    };
    debug!("Controller {id}: {command:?}");
    ctx.dispatcher.dispatch(command).await
}

async fn send_event(ws_tx: &mut WsSink, event: &ControllerEvent) -> anyhow::Result<()> {
    let frame = event
        .to_frame()
        .with_context(|| format!("failed to encode {}", event.name()))?;
    ws_tx
        .send(WsMessage::Text(frame))
        .await
        .with_context(|| format!("failed to send {}", event.name()))
}

/// Handshake callback enforcing the origin policy.
#[allow(clippy::result_large_err)]
fn check_origin(
    policy: &OriginPolicy,
    req: &Request,
    resp: Response,
) -> Result<Response, ErrorResponse> {
    let origin = req
        .headers()
        .get("origin")
        .and_then(|value| value.to_str().ok());
    if policy.allows(origin) {
        return Ok(resp);
    }

    warn!("Command channel: rejecting handshake from origin {origin:?}");
    let mut rejection = ErrorResponse::new(Some("origin not allowed".to_string()));
    *rejection.status_mut() = StatusCode::FORBIDDEN;
    Err(rejection)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
