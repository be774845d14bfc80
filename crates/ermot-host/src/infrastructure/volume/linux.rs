//! Linux volume through `amixer`.
//!
//! `amixer` talks to ALSA directly and, on desktops running PulseAudio or
//! PipeWire, to their ALSA compatibility plugin, so one command covers all
//! three.  `-M` selects the mapped (perceptual) scale that desktop volume
//! sliders display.
//!
//! A `get` prints one line per channel:
//!
//! ```text
//! Simple mixer control 'Master',0
//!   Front Left: Playback 42 [66%] [on]
//!   Front Right: Playback 42 [66%] [on]
//! ```
//!
//! The first `[NN%]` is taken as the level.

use async_trait::async_trait;

use super::run_tool;
use crate::application::volume::{VolumeControl, VolumeError};

const AMIXER: &str = "amixer";
const CONTROL: &str = "Master";

#[derive(Debug, Default, Clone, Copy)]
pub struct AmixerVolume;

impl AmixerVolume {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VolumeControl for AmixerVolume {
    async fn get_volume(&self) -> Result<u8, VolumeError> {
        let stdout = run_tool(AMIXER, &["-M", "get", CONTROL]).await?;
        parse_amixer_level(&stdout)
    }

    async fn set_volume(&self, level: u8) -> Result<(), VolumeError> {
        let arg = format!("{level}%");
        run_tool(AMIXER, &["-q", "-M", "set", CONTROL, &arg]).await?;
        Ok(())
    }
}

/// Extracts the first `[NN%]` from `amixer get` output.
fn parse_amixer_level(stdout: &str) -> Result<u8, VolumeError> {
    stdout
        .split('[')
        .skip(1)
        .find_map(|chunk| chunk.split_once("%]"))
        .and_then(|(digits, _)| digits.trim().parse::<u8>().ok())
        .map(|level| level.min(100))
        .ok_or_else(|| VolumeError::Parse(stdout.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stereo_output_takes_first_channel() {
        let stdout = "Simple mixer control 'Master',0\n  \
            Capabilities: pvolume pswitch\n  \
            Front Left: Playback 42 [66%] [on]\n  \
            Front Right: Playback 40 [64%] [on]\n";

        assert_eq!(parse_amixer_level(stdout).unwrap(), 66);
    }

    #[test]
    fn test_parse_mono_output() {
        let stdout = "Simple mixer control 'Master',0\n  Mono: Playback 87 [100%] [-0.00dB] [on]\n";

        assert_eq!(parse_amixer_level(stdout).unwrap(), 100);
    }

    #[test]
    fn test_parse_output_without_level_is_error() {
        let stdout = "amixer: Unable to find simple control 'Master',0\n";

        assert!(matches!(
            parse_amixer_level(stdout),
            Err(VolumeError::Parse(_))
        ));
    }
}
