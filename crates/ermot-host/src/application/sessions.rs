//! Shared session store and its expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use ermot_core::SessionStore;

use crate::application::background::BackgroundTask;

/// The session store as shared between the pairing publisher and the sweeper.
pub type SharedSessions = Arc<Mutex<SessionStore>>;

pub fn shared_sessions() -> SharedSessions {
    Arc::new(Mutex::new(SessionStore::new()))
}

/// Removes expired sessions every `period`.  The first sweep runs one full
/// period after spawning.
pub fn spawn_session_sweeper(sessions: SharedSessions, period: Duration) -> BackgroundTask {
    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; skip that tick.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut store = sessions.lock().await;
            let removed = store.clean_expired_sessions();
            if removed > 0 {
                info!("Session sweep removed {removed} expired session(s)");
            } else {
                debug!("Session sweep: {} live session(s)", store.session_count());
            }
        }
    });
    BackgroundTask::new("session-sweeper", handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    use ermot_core::domain::session::SESSION_TTL;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_sessions() {
        // Arrange: one session created well past the TTL, one fresh
        let sessions = shared_sessions();
        {
            let mut store = sessions.lock().await;
            let long_ago = SystemTime::now() - SESSION_TTL - Duration::from_secs(60);
            store.create_session_at("http://a:9000", "http://a:8080/m", long_ago);
            store.create_session("http://b:9000", "http://b:8080/m");
        }
        let task = spawn_session_sweeper(Arc::clone(&sessions), Duration::from_secs(3600));

        // Act
        tokio::time::sleep(Duration::from_secs(3601)).await;

        // Assert
        assert_eq!(sessions.lock().await.session_count(), 1);
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_does_not_run_immediately() {
        let sessions = shared_sessions();
        let long_ago = SystemTime::now() - SESSION_TTL - Duration::from_secs(60);
        sessions
            .lock()
            .await
            .create_session_at("http://a:9000", "http://a:8080/m", long_ago);

        let task = spawn_session_sweeper(Arc::clone(&sessions), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(sessions.lock().await.session_count(), 1);
        assert!(!task.is_finished());
    }
}
