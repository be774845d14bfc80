//! Windows volume through the Core Audio endpoint API.
//!
//! # How Core Audio volume works (for beginners)
//!
//! 1. `CoCreateInstance(MMDeviceEnumerator)` gives the device enumerator.
//! 2. `GetDefaultAudioEndpoint(eRender, eConsole)` picks the default
//!    playback device (speakers/headphones the user selected).
//! 3. `Activate::<IAudioEndpointVolume>()` returns the volume interface of
//!    that device.
//! 4. `Get/SetMasterVolumeLevelScalar` read and write the level as a float in
//!    `0.0..=1.0`, the same scale the taskbar slider shows.
//!
//! COM calls block and need COM initialised on the calling thread, so each
//! operation runs on tokio's blocking pool with its own `CoInitializeEx` /
//! `CoUninitialize` pair.  The default device is looked up every time so
//! plugging in headphones is picked up on the next poll.

use async_trait::async_trait;
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::Media::Audio::{eConsole, eRender, IMMDeviceEnumerator, MMDeviceEnumerator};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_MULTITHREADED,
};

use crate::application::volume::{VolumeControl, VolumeError};

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsVolume;

impl WindowsVolume {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VolumeControl for WindowsVolume {
    async fn get_volume(&self) -> Result<u8, VolumeError> {
        with_endpoint(|endpoint| {
            // SAFETY: `endpoint` is a live interface obtained on this thread.
            let scalar = unsafe { endpoint.GetMasterVolumeLevelScalar() }.map_err(platform)?;
            Ok(scalar_to_level(scalar))
        })
        .await
    }

    async fn set_volume(&self, level: u8) -> Result<(), VolumeError> {
        with_endpoint(move |endpoint| {
            let scalar = f32::from(level.min(100)) / 100.0;
            // SAFETY: a null event-context GUID is allowed by the API.
            unsafe { endpoint.SetMasterVolumeLevelScalar(scalar, std::ptr::null()) }
                .map_err(platform)
        })
        .await
    }
}

/// Uninitialises COM when dropped.
struct ComGuard;

impl Drop for ComGuard {
    fn drop(&mut self) {
        // SAFETY: paired with a successful CoInitializeEx on this thread.
        unsafe { CoUninitialize() };
    }
}

async fn with_endpoint<R, F>(f: F) -> Result<R, VolumeError>
where
    R: Send + 'static,
    F: FnOnce(&IAudioEndpointVolume) -> Result<R, VolumeError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        // SAFETY: COM is initialised for this blocking-pool thread and
        // released by `ComGuard` before the closure returns.
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(platform)?;
            let _com = ComGuard;

            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(platform)?;
            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(platform)?;
            let endpoint: IAudioEndpointVolume =
                device.Activate(CLSCTX_ALL, None).map_err(platform)?;
            f(&endpoint)
        }
    })
    .await
    .map_err(|e| VolumeError::Platform(format!("volume task failed: {e}")))?
}

fn platform(e: windows::core::Error) -> VolumeError {
    VolumeError::Platform(e.to_string())
}

fn scalar_to_level(scalar: f32) -> u8 {
    (scalar.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_to_level_rounds_and_clamps() {
        assert_eq!(scalar_to_level(0.666), 67);
        assert_eq!(scalar_to_level(1.2), 100);
        assert_eq!(scalar_to_level(-0.1), 0);
    }
}
