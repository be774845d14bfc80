//! macOS volume through AppleScript (`osascript`).

use async_trait::async_trait;

use super::run_tool;
use crate::application::volume::{VolumeControl, VolumeError};

const OSASCRIPT: &str = "osascript";

#[derive(Debug, Default, Clone, Copy)]
pub struct OsascriptVolume;

impl OsascriptVolume {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VolumeControl for OsascriptVolume {
    async fn get_volume(&self) -> Result<u8, VolumeError> {
        let stdout = run_tool(
            OSASCRIPT,
            &["-e", "output volume of (get volume settings)"],
        )
        .await?;
        parse_output_volume(&stdout)
    }

    async fn set_volume(&self, level: u8) -> Result<(), VolumeError> {
        let script = format!("set volume output volume {level}");
        run_tool(OSASCRIPT, &["-e", &script]).await?;
        Ok(())
    }
}

/// `osascript` prints the level followed by a newline, or `missing value`
/// when the output device has no software volume (HDMI, some DACs).
fn parse_output_volume(stdout: &str) -> Result<u8, VolumeError> {
    stdout
        .trim()
        .parse::<u8>()
        .map(|level| level.min(100))
        .map_err(|_| VolumeError::Parse(stdout.trim().to_string()))
}
