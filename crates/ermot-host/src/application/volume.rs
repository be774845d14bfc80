//! VolumeWatcher: polls the OS volume and fans changes out.
//!
//! # How it works (for beginners)
//!
//! Nothing tells us when the user turns the volume knob, so the watcher asks
//! the OS every `interval` (500 ms by default).  The first answer just sets
//! the baseline.  After that, every time the answer differs from the previous
//! one the watcher:
//!
//! 1. pushes a `volume` notification to the host UI, and
//! 2. broadcasts `volumeActuel` to every connected controller.
//!
//! A failed read is logged and the next tick tries again.  The watcher lives
//! in a [`BackgroundTask`]; dropping that handle stops polling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use ermot_core::domain::notification::HostNotification;
use ermot_core::domain::volume::{VolumeChange, VolumeChangeDetector};
use ermot_core::protocol::event::ControllerEvent;

use crate::application::background::BackgroundTask;
use crate::application::notify::{ControllerBroadcast, HostNotifier};

/// Error type for OS volume access.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    CommandFailed {
        program: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("could not parse volume from {0:?}")]
    Parse(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("volume control is not supported on this platform")]
    Unsupported,
}

/// Reads and writes the system output volume (0..=100).
#[async_trait]
pub trait VolumeControl: Send + Sync {
    async fn get_volume(&self) -> Result<u8, VolumeError>;

    async fn set_volume(&self, level: u8) -> Result<(), VolumeError>;
}

/// Polls [`VolumeControl`] and reports changes.
pub struct VolumeWatcher {
    volume: Arc<dyn VolumeControl>,
    notifier: Arc<dyn HostNotifier>,
    broadcast: Arc<dyn ControllerBroadcast>,
    detector: VolumeChangeDetector,
}

impl VolumeWatcher {
    pub fn new(
        volume: Arc<dyn VolumeControl>,
        notifier: Arc<dyn HostNotifier>,
        broadcast: Arc<dyn ControllerBroadcast>,
    ) -> Self {
        Self {
            volume,
            notifier,
            broadcast,
            detector: VolumeChangeDetector::new(),
        }
    }

    /// Runs one poll.  Returns the change it reported, if any.
    pub async fn tick(&mut self) -> Option<VolumeChange> {
        let current = match self.volume.get_volume().await {
            Ok(level) => level,
            Err(e) => {
                warn!("volume watch: read failed: {e}");
                return None;
            }
        };

        let change = self.detector.observe(current)?;
        debug!("volume watch: {} -> {}", change.previous, change.current);
        self.notifier.notify(HostNotification::volume(change.current));
        self.broadcast.broadcast(ControllerEvent::Volume {
            data: change.current,
        });
        Some(change)
    }

    /// Polls every `period` on a spawned task until the handle is dropped.
    pub fn spawn(mut self, period: Duration) -> BackgroundTask {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        });
        BackgroundTask::new("volume-watcher", handle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::volume::scripted::ScriptedVolume;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        notifications: Mutex<Vec<HostNotification>>,
        events: Mutex<Vec<ControllerEvent>>,
    }

    impl HostNotifier for Recorder {
        fn notify(&self, notification: HostNotification) {
            self.notifications.lock().unwrap().push(notification);
        }
    }

    impl ControllerBroadcast for Recorder {
        fn broadcast(&self, event: ControllerEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn watcher(volume: Arc<ScriptedVolume>, recorder: &Arc<Recorder>) -> VolumeWatcher {
        VolumeWatcher::new(volume, recorder.clone(), recorder.clone())
    }

    #[tokio::test]
    async fn test_first_read_sets_baseline_silently() {
        // Arrange
        let recorder = Arc::new(Recorder::default());
        let mut w = watcher(Arc::new(ScriptedVolume::new(40)), &recorder);

        // Act
        let change = w.tick().await;

        // Assert
        assert_eq!(change, None);
        assert!(recorder.notifications.lock().unwrap().is_empty());
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_change_is_notified_and_broadcast_once() {
        // Arrange
        let recorder = Arc::new(Recorder::default());
        let volume = Arc::new(ScriptedVolume::new(40));
        let mut w = watcher(Arc::clone(&volume), &recorder);
        w.tick().await;

        // Act
        volume.set_level(45);
        let first = w.tick().await;
        let second = w.tick().await;

        // Assert
        assert_eq!(
            first,
            Some(VolumeChange {
                previous: 40,
                current: 45
            })
        );
        assert_eq!(second, None);
        assert_eq!(
            *recorder.notifications.lock().unwrap(),
            vec![HostNotification::volume(45)]
        );
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![ControllerEvent::Volume { data: 45 }]
        );
    }

    #[tokio::test]
    async fn test_failed_read_does_not_stop_watching() {
        // Arrange
        let recorder = Arc::new(Recorder::default());
        let volume = Arc::new(ScriptedVolume::new(40));
        let mut w = watcher(Arc::clone(&volume), &recorder);
        w.tick().await;

        // Act
        volume.fail_reads(true);
        assert_eq!(w.tick().await, None);
        volume.fail_reads(false);
        volume.set_level(10);
        let change = w.tick().await;

        // Assert: the baseline survived the failed read
        assert_eq!(
            change,
            Some(VolumeChange {
                previous: 40,
                current: 10
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_watcher_polls_on_interval() {
        // Arrange
        let recorder = Arc::new(Recorder::default());
        let volume = Arc::new(ScriptedVolume::new(20));
        let task = watcher(Arc::clone(&volume), &recorder).spawn(Duration::from_millis(500));

        // Act: let the baseline tick run, change the level, advance one period
        tokio::time::sleep(Duration::from_millis(10)).await;
        volume.set_level(30);
        tokio::time::sleep(Duration::from_millis(600)).await;

        // Assert
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![ControllerEvent::Volume { data: 30 }]
        );
        task.stop();
    }
}
