//! Infrastructure layer for the host.
//!
//! Contains OS-facing adapters: input automation, OS volume, network
//! listeners, QR rendering, file-system storage, and the host window bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `ermot_core`, but MUST NOT be imported by the `application` or domain
//! layers (test fakes excepted).
//!
//! # Sub-modules
//!
//! - **`automation`** – `InputAutomation` backed by `enigo` + `arboard`, the
//!   shell runner for power commands, and the recording `MockAutomation`.
//! - **`volume`** – OS-specific `VolumeControl` implementations, selected at
//!   compile time with `#[cfg(target_os)]`, plus the `ScriptedVolume` fake.
//! - **`network`** – the WebSocket command channel and interface discovery.
//! - **`mobile_server`** – the auxiliary HTTP server (static files,
//!   `/api/resolve`, optional TLS).
//! - **`qr`** – SVG rendering of the pairing payload.
//! - **`storage`** – TOML configuration.
//! - **`ui_bridge`** – the in-process channel to the host window.

pub mod automation;
pub mod mobile_server;
pub mod network;
pub mod qr;
pub mod storage;
pub mod ui_bridge;
pub mod volume;
