//! Platform-specific system volume access.
//!
//! Each platform implements
//! [`VolumeControl`](crate::application::volume::VolumeControl); the correct
//! one is selected at compile time via `#[cfg(target_os = ...)]` and
//! re-exported as `NativeVolume`:
//!
//! | Module    | OS      | Mechanism                                         |
//! |-----------|---------|---------------------------------------------------|
//! | `windows` | Windows | Core Audio `IAudioEndpointVolume` (COM)           |
//! | `linux`   | Linux   | `amixer -M get/set Master` (ALSA, PulseAudio, PipeWire) |
//! | `macos`   | macOS   | `osascript` "output volume of (get volume settings)" |
//!
//! [`ScriptedVolume`](scripted::ScriptedVolume) is always compiled so tests
//! on any platform can use it.

pub mod scripted;

/// Runs a volume tool and returns its stdout.
#[cfg(any(target_os = "linux", target_os = "macos"))]
async fn run_tool(
    program: &'static str,
    args: &[&str],
) -> Result<String, crate::application::volume::VolumeError> {
    use crate::application::volume::VolumeError;

    let output = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| VolumeError::Spawn { program, source })?;
    if !output.status.success() {
        return Err(VolumeError::CommandFailed {
            program,
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::WindowsVolume as NativeVolume;

// ── Linux implementation ──────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::AmixerVolume as NativeVolume;

// ── macOS implementation ──────────────────────────────────────────────────────

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::OsascriptVolume as NativeVolume;

// ── Other platforms ───────────────────────────────────────────────────────────

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
pub use unsupported::UnsupportedVolume as NativeVolume;

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
mod unsupported {
    use async_trait::async_trait;

    use crate::application::volume::{VolumeControl, VolumeError};

    /// Every call fails with [`VolumeError::Unsupported`].
    #[derive(Debug, Default)]
    pub struct UnsupportedVolume;

    impl UnsupportedVolume {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl VolumeControl for UnsupportedVolume {
        async fn get_volume(&self) -> Result<u8, VolumeError> {
            Err(VolumeError::Unsupported)
        }

        async fn set_volume(&self, _level: u8) -> Result<(), VolumeError> {
            Err(VolumeError::Unsupported)
        }
    }
}
