//! Application layer use cases for the host.
//!
//! # What use cases does the host have?
//!
//! - **`dispatch`** – Runs one decoded controller command and produces the
//!   reply (if any) for the controller that sent it.
//! - **`host_actions`** – Translates commands into automation primitives and
//!   folds every failure into an `ActionResult`.
//! - **`pairing`** – Builds the pairing URL, renders it as a QR image, records
//!   a session, and pushes the result to the host window.
//! - **`volume`** – Polls the OS volume and announces changes.
//! - **`sessions`** – Periodically drops expired pairing sessions.
//!
//! Each use case receives its OS-facing collaborators as trait objects
//! (`InputAutomation`, `VolumeControl`, `QrEncoder`, `HostNotifier`, ...)
//! so tests can substitute in-memory fakes.

pub mod background;
pub mod dispatch;
pub mod host_actions;
pub mod notify;
pub mod pairing;
pub mod sessions;
pub mod volume;
