//! In-memory volume for tests.
//!
//! `ScriptedVolume` holds a level that tests change directly (as if the user
//! turned the knob) and records every `set_volume` call.  `fail_reads`
//! makes `get_volume` fail until switched off again.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::volume::{VolumeControl, VolumeError};

#[derive(Debug, Default)]
pub struct ScriptedVolume {
    level: AtomicU8,
    failing: AtomicBool,
    writes: Mutex<Vec<u8>>,
}

impl ScriptedVolume {
    pub fn new(level: u8) -> Self {
        Self {
            level: AtomicU8::new(level),
            ..Self::default()
        }
    }

    /// Changes the level behind the host's back.
    pub fn set_level(&self, level: u8) {
        self.level.store(level, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Levels passed to `set_volume`, oldest first.
    pub fn writes(&self) -> Vec<u8> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl VolumeControl for ScriptedVolume {
    async fn get_volume(&self) -> Result<u8, VolumeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VolumeError::Platform("scripted read failure".into()));
        }
        Ok(self.level.load(Ordering::SeqCst))
    }

    async fn set_volume(&self, level: u8) -> Result<(), VolumeError> {
        self.writes.lock().unwrap().push(level);
        self.set_level(level);
        Ok(())
    }
}
