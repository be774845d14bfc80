//! Domain entities for Ermot.
//!
//! Everything here is pure: no sockets, no files, no clocks except where a
//! timestamp is passed in.  The host crate wires these rules to the OS.

/// Pairing sessions keyed by six-character codes.
pub mod session;

/// Volume limits, clamping, and change detection.
pub mod volume;

/// Choosing the LAN address the controller should dial.
pub mod connection;

/// Pairing URL composition and QR rendering options.
pub mod pairing;

/// Push notifications for the host window.
pub mod notification;
