//! Handle for a periodic background task.

use tokio::task::JoinHandle;
use tracing::debug;

/// Owns a spawned task and cancels it when stopped or dropped.
pub struct BackgroundTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self { name, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the task.
    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("{} stopped", self.name);
    }
}
