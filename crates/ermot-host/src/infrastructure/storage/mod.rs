//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the
//! platform-appropriate directory (or an explicit `--config` path), writes
//! a default file on request, and supplies defaults on first run.

pub mod config;
