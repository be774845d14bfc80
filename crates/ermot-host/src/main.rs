//! Ermot desktop host: entry point.
//!
//! Starts every host-side service and wires them together:
//!
//! ```text
//!                        ┌──────────────────────────┐
//!  phone ──WebSocket────►│ command channel (:9000)  │──► CommandDispatcher ──► HostActionGateway
//!    │                   └──────────────────────────┘          │                  (enigo, shell)
//!    │                              ▲ volumeActuel             ▼
//!    │                              └──────────── VolumeWatcher ◄── OS volume
//!    └──HTTP(S)─────────►  mobile server (:8080)  static page + /api/resolve
//!
//!  UiBridge ◄── state / volume / mouse / qrcode / mobile-server notifications
//! ```
//!
//! # Usage
//!
//! ```text
//! ermot-host [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Config file [default: platform config dir]
//!   --socket-port <PORT>     Command channel port            [env: ERMOT_SOCKET_PORT]
//!   --mobile-port <PORT>     Mobile server port              [env: ERMOT_MOBILE_PORT]
//!   --root-dir <DIR>         Mobile page directory           [env: ERMOT_ROOT_DIR]
//!   --no-mobile-server       Do not start the mobile server
//!   --write-default-config   Write a default config file and exit
//! ```
//!
//! Command-line values override the config file.  `RUST_LOG` overrides the
//! log level (`info`, or `warn` with `[logging] minimal = true`).
//!
//! # Failure policy
//!
//! Only a broken configuration or a missing automation thread stops startup.
//! If the command channel cannot bind, the host window is told (red socket
//! status) and the other services keep running; the same goes for the
//! mobile server.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ermot_core::domain::notification::{Component, HostNotification, StatusColor};
use ermot_core::domain::pairing::Scheme;
use ermot_core::domain::session::SWEEP_INTERVAL;

use ermot_host::application::dispatch::CommandDispatcher;
use ermot_host::application::host_actions::HostActionGateway;
use ermot_host::application::notify::HostNotifier;
use ermot_host::application::pairing::{ConnectionInfoSource, PairingPublisher, PairingSettings};
use ermot_host::application::sessions::{shared_sessions, spawn_session_sweeper};
use ermot_host::application::volume::{VolumeControl, VolumeWatcher};
use ermot_host::infrastructure::automation::desktop::EnigoAutomation;
use ermot_host::infrastructure::automation::power::ShellCommandRunner;
use ermot_host::infrastructure::mobile_server::{
    announce, bind_mobile_server, router, serve_mobile_server, tls::load_tls, MobileState,
};
use ermot_host::infrastructure::network::broadcast::ControllerBroadcaster;
use ermot_host::infrastructure::network::interfaces::ConnectionInfoResolver;
use ermot_host::infrastructure::network::ws_server::{
    bind_command_channel, run_command_channel, ChannelContext, OriginPolicy,
};
use ermot_host::infrastructure::qr::SvgQrEncoder;
use ermot_host::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use ermot_host::infrastructure::ui_bridge::{spawn_console_window, UiBridge};
use ermot_host::infrastructure::volume::NativeVolume;

/// Delay before the first volume reading is pushed to the host window.
const INITIAL_VOLUME_DELAY: Duration = Duration::from_millis(100);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Ermot desktop host.
///
/// Lets a phone on the same network drive this computer's pointer, keyboard,
/// media keys, power state, and volume.
#[derive(Debug, Parser)]
#[command(name = "ermot-host", about = "Desktop host for the Ermot phone remote", version)]
struct Cli {
    /// Path of the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port for the WebSocket command channel.
    #[arg(long, env = "ERMOT_SOCKET_PORT")]
    socket_port: Option<u16>,

    /// Port for the mobile page server.
    #[arg(long, env = "ERMOT_MOBILE_PORT")]
    mobile_port: Option<u16>,

    /// Directory the mobile page is served from.
    #[arg(long, env = "ERMOT_ROOT_DIR")]
    root_dir: Option<PathBuf>,

    /// Do not start the mobile page server.
    #[arg(long)]
    no_mobile_server: bool,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    write_default_config: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }

    /// Loads the config file and applies command-line overrides.
    fn into_app_config(self) -> anyhow::Result<AppConfig> {
        let path = self.config_path()?;
        let mut config = load_config_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        if let Some(port) = self.socket_port {
            config.socket.port = port;
        }
        if let Some(port) = self.mobile_port {
            config.mobile_server.port = port;
        }
        if let Some(dir) = self.root_dir {
            config.mobile_server.root_dir = dir;
        }
        if self.no_mobile_server {
            config.mobile_server.enabled = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn default_log_level(config: &AppConfig) -> &'static str {
    if config.logging.minimal {
        "warn"
    } else {
        "info"
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.write_default_config {
        let path = cli.config_path()?;
        save_config_to(&AppConfig::default(), &path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = cli.into_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_level(&config))),
        )
        .init();

    info!(
        "Ermot host starting: command channel {}:{}, mobile server {}",
        config.socket.host,
        config.socket.port,
        if config.mobile_server.enabled {
            format!("port {}", config.mobile_server.port)
        } else {
            "disabled".to_string()
        }
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("Failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Host window bridge ────────────────────────────────────────────────────
    let bridge = UiBridge::new();
    let console = spawn_console_window(&bridge);
    let notifier: Arc<dyn HostNotifier> = Arc::new(bridge.clone());
    notifier.notify(HostNotification::status(
        Component::Server,
        StatusColor::Green,
        "Application started",
    ));

    // ── Host capabilities ─────────────────────────────────────────────────────
    let volume: Arc<dyn VolumeControl> = Arc::new(NativeVolume::new());
    let input = EnigoAutomation::start().context("failed to start automation thread")?;
    let gateway = Arc::new(HostActionGateway::new(
        Arc::new(input),
        Arc::new(ShellCommandRunner::new()),
    ));
    let limits = config.volume.limits()?;
    let dispatcher = Arc::new(CommandDispatcher::new(
        gateway,
        Arc::clone(&volume),
        Arc::clone(&notifier),
        limits,
    ));

    {
        let volume = Arc::clone(&volume);
        let notifier = Arc::clone(&notifier);
        tokio::spawn(async move {
            tokio::time::sleep(INITIAL_VOLUME_DELAY).await;
            match volume.get_volume().await {
                Ok(level) => notifier.notify(HostNotification::volume(level)),
                Err(e) => warn!("Initial volume read failed: {e}"),
            }
        });
    }

    // ── Command channel ───────────────────────────────────────────────────────
    let broadcaster = ControllerBroadcaster::new();
    let channel_task = match bind_command_channel(&config.socket.host, config.socket.port).await {
        Ok(listener) => {
            notifier.notify(HostNotification::status(
                Component::Socket,
                StatusColor::Green,
                format!("Socket server listening on port {}", config.socket.port),
            ));
            let ctx = Arc::new(ChannelContext::new(
                Arc::clone(&dispatcher),
                Arc::clone(&notifier),
                broadcaster.clone(),
                OriginPolicy::from_config(&config.socket.cors_origin),
            ));
            Some(tokio::spawn(run_command_channel(
                listener,
                ctx,
                Arc::clone(&running),
            )))
        }
        Err(e) => {
            error!("{e}");
            notifier.notify(HostNotification::status(
                Component::Socket,
                StatusColor::Red,
                format!("Socket server error: {e}"),
            ));
            None
        }
    };

    // ── Mobile server ─────────────────────────────────────────────────────────
    let resolver = Arc::new(ConnectionInfoResolver::new(config.socket.port));
    let mobile = &config.mobile_server;
    let tls = if mobile.use_https {
        match load_tls(
            std::path::Path::new(&mobile.key_path),
            std::path::Path::new(&mobile.cert_path),
        ) {
            Ok(acceptor) => Some(acceptor),
            Err(e) => {
                warn!("{e}; serving the mobile page over plain HTTP");
                None
            }
        }
    } else {
        None
    };
    let scheme = Scheme::from_tls(tls.is_some());

    if mobile.enabled {
        match bind_mobile_server(mobile.port).await {
            Ok(listener) => {
                let info = resolver.connection_info();
                let state = MobileState::new(
                    mobile.root_dir.clone(),
                    mobile.entry_document.clone(),
                    info.url.clone(),
                );
                let running = Arc::clone(&running);
                tokio::spawn(async move {
                    if let Err(e) = serve_mobile_server(listener, router(state), tls, running).await
                    {
                        error!("{e}");
                    }
                });
                let url = format!("{}://{}:{}", scheme.as_str(), info.ip, mobile.port);
                tokio::spawn(announce(Arc::clone(&notifier), url, mobile.port));
            }
            Err(e) => error!("{e}; choose another [mobile_server] port"),
        }
    }

    // ── Background services ───────────────────────────────────────────────────
    let watcher = VolumeWatcher::new(
        Arc::clone(&volume),
        Arc::clone(&notifier),
        Arc::new(broadcaster.clone()),
    )
    .spawn(config.volume.watch_interval());

    let sessions = shared_sessions();
    let sweeper = spawn_session_sweeper(Arc::clone(&sessions), SWEEP_INTERVAL);

    let publisher = PairingPublisher::new(
        resolver,
        Arc::new(SvgQrEncoder::new()),
        sessions,
        PairingSettings {
            scheme,
            entry_document: mobile.entry_document.clone(),
            qr: config.pairing.qr_options(),
            publish_delay: config.pairing.publish_delay(),
        },
    );
    let mobile_port = mobile.port;
    {
        let notifier = Arc::clone(&notifier);
        tokio::spawn(async move {
            publisher.publish(notifier.as_ref(), mobile_port).await;
        });
    }

    // ── Run until Ctrl+C ──────────────────────────────────────────────────────
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    watcher.stop();
    sweeper.stop();
    if let Some(task) = channel_task {
        if tokio::time::timeout(Duration::from_secs(1), task).await.is_err() {
            warn!("Command channel did not stop in time");
        }
    }
    console.stop();

    info!("Ermot host stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
