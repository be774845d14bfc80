//! # ermot-core
//!
//! Shared library for Ermot containing the pairing/session rules, volume
//! rules, host-UI notification types, and the JSON protocol spoken between a
//! mobile controller and the desktop host.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, network
//! sockets, or an async runtime.
//!
//! # Architecture overview (for beginners)
//!
//! Ermot turns a phone into a remote control for a desktop machine.  The
//! desktop runs the *host*; the phone runs a small web page, the
//! *controller*.  The host shows a QR code, the phone scans it, opens a
//! WebSocket back to the host, and from then on sends small named commands
//! (`mouse-move`, `keyboard-type`, `set-volume`, ...).
//!
//! This crate (`ermot-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure rules with no OS dependencies: pairing sessions and
//!   their 24-hour expiry, volume clamping and change detection, picking the
//!   LAN address to advertise, composing the pairing URL, and the
//!   notifications pushed to the host window.
//!
//! - **`protocol`** – The controller wire format: the command catalogue and
//!   its payload decoding, the result events sent back, and the key-name
//!   vocabulary used by `keyboard-key`.

pub mod domain;
pub mod protocol;

pub use domain::session::{Session, SessionStore};
pub use domain::volume::{VolumeChange, VolumeChangeDetector, VolumeLimits};
pub use protocol::command::{decode_command, CommandDecodeError, CommandName, ControllerCommand};
pub use protocol::event::ControllerEvent;
pub use protocol::result::ActionResult;
