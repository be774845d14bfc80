//! ermot-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the host do? (for beginners)
//!
//! The host runs on the desktop that is being controlled.  At startup it:
//!
//! 1. Opens the WebSocket *command channel* that phones connect to.
//! 2. Serves the mobile controller page over HTTP (optionally HTTPS).
//! 3. Renders a QR code pointing at that page and pushes it to its window.
//! 4. Polls the system volume so every phone sees changes made elsewhere.
//!
//! Commands arriving on the channel are decoded by `ermot-core`, executed by
//! the host action gateway (mouse, keyboard, media keys, power actions), and
//! answered with a result event.

/// Application layer: use cases and the capability traits they depend on.
pub mod application;

/// Infrastructure layer: sockets, HTTP, OS automation, OS audio, config files.
pub mod infrastructure;
