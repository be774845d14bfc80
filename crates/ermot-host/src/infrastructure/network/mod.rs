//! Network infrastructure for the host.
//!
//! - **`ws_server`** – the command channel: WebSocket accept loop, origin
//!   check, and one task per connected controller.
//! - **`broadcast`** – fan-out of events to every connected controller.
//! - **`interfaces`** – `ConnectionInfoResolver`, which picks the LAN address
//!   advertised in the pairing payload.

pub mod broadcast;
pub mod interfaces;
pub mod ws_server;
