//! TOML-based configuration persistence for the host.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Ermot\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/ermot/config.toml` (or `~/.config/ermot`)
//! - macOS:    `~/Library/Application Support/Ermot/config.toml`
//!
//! [`config_file_path`] gives that default; a different file can be named on
//! the command line (`--config`).  Both go through [`load_config_from`] and
//! [`save_config_to`].
//!
//! # Example file
//!
//! ```toml
//! [socket]
//! host = "0.0.0.0"
//! port = 9000
//! cors_origin = "*"
//!
//! [mobile_server]
//! enabled = true
//! port = 8080
//! use_https = false
//!
//! [volume]
//! min = 0
//! max = 100
//! watch_interval_ms = 500
//! ```
//!
//! Every field has a `#[serde(default = ...)]`, so a missing section or key
//! falls back to the built-in value and an absent file yields
//! `AppConfig::default()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ermot_core::domain::pairing::{ErrorCorrection, QrOptions};
use ermot_core::domain::volume::{VolumeLimits, VolumeLimitsError};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The values parsed but do not make sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<VolumeLimitsError> for ConfigError {
    fn from(e: VolumeLimitsError) -> Self {
        Self::Invalid(format!("[volume] {e}"))
    }
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub socket: SocketConfig,
    #[serde(default)]
    pub mobile_server: MobileServerConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Command channel listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketConfig {
    /// Bind address.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_host")]
    pub host: String,
    #[serde(default = "default_socket_port")]
    pub port: u16,
    /// Allowed browser origin for the WebSocket handshake; `"*"` allows any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

/// Auxiliary HTTP server for the mobile controller page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MobileServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_mobile_port")]
    pub port: u16,
    #[serde(default)]
    pub use_https: bool,
    /// PEM private key; only read when `use_https` is set.
    #[serde(default)]
    pub key_path: String,
    /// PEM certificate chain; only read when `use_https` is set.
    #[serde(default)]
    pub cert_path: String,
    /// Directory the static files are served from.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Document served for `/` and used in the pairing URL.
    #[serde(default = "default_entry_document")]
    pub entry_document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeConfig {
    #[serde(default)]
    pub min: u8,
    #[serde(default = "default_volume_max")]
    pub max: u8,
    /// Poll period of the volume watcher.
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairingConfig {
    /// Delay before the pairing QR code is pushed to the host window.
    #[serde(default = "default_publish_delay_ms")]
    pub publish_delay_ms: u64,
    #[serde(default = "default_qr_size")]
    pub qr_size: u32,
    #[serde(default = "default_qr_margin")]
    pub qr_margin: u32,
    #[serde(default = "default_qr_error_correction")]
    pub qr_error_correction: ErrorCorrection,
    #[serde(default = "default_qr_dark")]
    pub qr_dark: String,
    #[serde(default = "default_qr_light")]
    pub qr_light: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log warnings and errors only (unless `RUST_LOG` says otherwise).
    #[serde(default)]
    pub minimal: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}
fn default_socket_port() -> u16 {
    9000
}
fn default_cors_origin() -> String {
    "*".to_string()
}
fn default_mobile_port() -> u16 {
    8080
}
fn default_root_dir() -> PathBuf {
    PathBuf::from("mobile")
}
fn default_entry_document() -> String {
    "mobile-client.html".to_string()
}
fn default_volume_max() -> u8 {
    100
}
fn default_watch_interval_ms() -> u64 {
    500
}
fn default_publish_delay_ms() -> u64 {
    800
}
fn default_qr_size() -> u32 {
    400
}
fn default_qr_margin() -> u32 {
    2
}
fn default_qr_error_correction() -> ErrorCorrection {
    ErrorCorrection::Medium
}
fn default_qr_dark() -> String {
    "#000000".to_string()
}
fn default_qr_light() -> String {
    "#FFFFFF".to_string()
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_socket_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl Default for MobileServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_mobile_port(),
            use_https: false,
            key_path: String::new(),
            cert_path: String::new(),
            root_dir: default_root_dir(),
            entry_document: default_entry_document(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            min: 0,
            max: default_volume_max(),
            watch_interval_ms: default_watch_interval_ms(),
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            publish_delay_ms: default_publish_delay_ms(),
            qr_size: default_qr_size(),
            qr_margin: default_qr_margin(),
            qr_error_correction: default_qr_error_correction(),
            qr_dark: default_qr_dark(),
            qr_light: default_qr_light(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl AppConfig {
    /// Checks cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for inverted or out-of-range volume
    /// limits and a zero watch interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.volume.limits()?;
        if self.volume.watch_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "[volume] watch_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl VolumeConfig {
    pub fn limits(&self) -> Result<VolumeLimits, VolumeLimitsError> {
        VolumeLimits::new(self.min, self.max)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

impl PairingConfig {
    pub fn qr_options(&self) -> QrOptions {
        QrOptions {
            size: self.qr_size,
            margin: self.qr_margin,
            error_correction: self.qr_error_correction,
            dark: self.qr_dark.clone(),
            light: self.qr_light.clone(),
        }
    }

    pub fn publish_delay(&self) -> Duration {
        Duration::from_millis(self.publish_delay_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads and validates `AppConfig` from `path`, returning
/// `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if validation fails.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Persists `config` to `path`, creating parent directories as needed.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory, including the `Ermot` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Ermot"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("ermot"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Ermot")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_has_expected_ports() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.socket.port, 9000);
        assert_eq!(cfg.mobile_server.port, 8080);
        assert_eq!(cfg.socket.cors_origin, "*");
    }

    #[test]
    fn test_default_volume_and_pairing_settings() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.volume.limits().unwrap(), VolumeLimits::default());
        assert_eq!(cfg.volume.watch_interval(), Duration::from_millis(500));
        assert_eq!(cfg.pairing.publish_delay(), Duration::from_millis(800));
        assert_eq!(cfg.pairing.qr_options(), QrOptions::default());
        assert!(!cfg.logging.minimal);
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[mobile_server]
port = 8443
use_https = true

[pairing]
qr_error_correction = "high"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.mobile_server.port, 8443);
        assert!(cfg.mobile_server.use_https);
        assert_eq!(cfg.mobile_server.entry_document, "mobile-client.html");
        assert_eq!(cfg.pairing.qr_error_correction, ErrorCorrection::High);
        assert_eq!(cfg.socket.port, 9000);
    }

    #[test]
    fn test_app_config_serializes_and_deserializes_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.socket.port = 9100;
        cfg.volume.max = 80;
        cfg.logging.minimal = true;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_inverted_volume_limits_are_rejected() {
        let mut cfg = AppConfig::default();
        cfg.volume.min = 60;
        cfg.volume.max = 40;

        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_watch_interval_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.volume.watch_interval_ms = 0;

        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();

        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip_via_temp_dir() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.socket.port = 12345;
        cfg.mobile_server.root_dir = PathBuf::from("/srv/ermot");

        // Act
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
    }
}
