//! Pairing sessions.
//!
//! A session is created every time the host renders a pairing payload.  It
//! remembers which control-channel URL and mobile-entry URL were advertised
//! under a short human-enterable code, and it is forgotten 24 hours later.
//!
//! # Why pass `now` explicitly? (for beginners)
//!
//! Expiry logic that calls `SystemTime::now()` internally can only be tested
//! by sleeping for a day.  Every time-sensitive operation here therefore has
//! an `*_at(now)` variant that takes the current time as a parameter; the
//! convenience wrappers simply pass `SystemTime::now()`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// How long a session stays resolvable after it was created.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How often the host sweeps expired sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Number of random bytes behind a code; each byte renders as two hex digits.
const CODE_BYTES: usize = 3;

/// One advertised pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Six uppercase hex characters, e.g. `"4F0A9C"`.
    pub code: String,
    /// Control-channel URL advertised to the controller (`http://ip:port`).
    pub server_url: String,
    /// Mobile entry URL encoded into the QR code.
    pub mobile_url: String,
    pub created_at: SystemTime,
}

impl Session {
    /// Returns `true` when the session is strictly older than [`SESSION_TTL`].
    ///
    /// A `created_at` in the future (clock moved backwards) is never expired.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now.duration_since(self.created_at)
            .map(|age| age > SESSION_TTL)
            .unwrap_or(false)
    }
}

/// In-memory registry of live pairing sessions, keyed by uppercase code.
///
/// The store itself is a plain struct; the host wraps it in a
/// `tokio::sync::Mutex` and shares it between the pairing publisher and the
/// hourly sweeper.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session stamped with the current wall-clock time.
    pub fn create_session(&mut self, server_url: &str, mobile_url: &str) -> String {
        self.create_session_at(server_url, mobile_url, SystemTime::now())
    }

    /// Creates a session stamped with `now` and returns its code.
    ///
    /// A code collision silently replaces the older session.
    pub fn create_session_at(
        &mut self,
        server_url: &str,
        mobile_url: &str,
        now: SystemTime,
    ) -> String {
        let code = generate_code();
        self.sessions.insert(
            code.clone(),
            Session {
                code: code.clone(),
                server_url: server_url.to_string(),
                mobile_url: mobile_url.to_string(),
                created_at: now,
            },
        );
        tracing::debug!("session {code} created for {server_url}");
        code
    }

    /// Looks up a session by code, ignoring case.
    pub fn get_session(&self, code: &str) -> Option<&Session> {
        self.sessions.get(&code.to_ascii_uppercase())
    }

    /// Removes every session older than [`SESSION_TTL`]; returns how many went.
    pub fn clean_expired_sessions(&mut self) -> usize {
        self.clean_expired_sessions_at(SystemTime::now())
    }

    pub fn clean_expired_sessions_at(&mut self, now: SystemTime) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired_at(now));
        before - self.sessions.len()
    }

    /// Number of live (not yet swept) sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Generates a six-character uppercase hex code from three random bytes.
pub fn generate_code() -> String {
    let bytes: [u8; CODE_BYTES] = rand::random();
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "http://192.168.1.20:9000";
    const MOBILE: &str = "http://192.168.1.20:8080/mobile-client.html";

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[test]
    fn test_generated_codes_are_six_uppercase_hex_digits() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), 6, "bad length: {code}");
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
                "not uppercase hex: {code}"
            );
        }
    }

    #[test]
    fn test_create_session_returns_code_that_resolves() {
        // Arrange
        let mut store = SessionStore::new();

        // Act
        let code = store.create_session(SERVER, MOBILE);

        // Assert
        let session = store.get_session(&code).expect("session must exist");
        assert_eq!(session.code, code);
        assert_eq!(session.server_url, SERVER);
        assert_eq!(session.mobile_url, MOBILE);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_get_session_is_case_insensitive() {
        let mut store = SessionStore::new();
        let code = store.create_session(SERVER, MOBILE);

        let upper = store.get_session(&code).cloned();
        let lower = store.get_session(&code.to_lowercase()).cloned();

        assert!(upper.is_some());
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_get_session_misses_unknown_and_malformed_codes() {
        let mut store = SessionStore::new();
        store.create_session(SERVER, MOBILE);

        assert!(store.get_session("").is_none());
        assert!(store.get_session("not a code").is_none());
    }

    #[test]
    fn test_session_survives_sweep_just_before_ttl() {
        // Arrange
        let mut store = SessionStore::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let code = store.create_session_at(SERVER, MOBILE, t0);

        // Act: sweep at T+23h59m
        let removed = store.clean_expired_sessions_at(t0 + SESSION_TTL - minutes(1));

        // Assert
        assert_eq!(removed, 0);
        assert!(store.get_session(&code).is_some());
    }

    #[test]
    fn test_session_is_removed_by_sweep_after_ttl() {
        // Arrange
        let mut store = SessionStore::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let code = store.create_session_at(SERVER, MOBILE, t0);

        // Act: sweep at T+24h01m
        let removed = store.clean_expired_sessions_at(t0 + SESSION_TTL + minutes(1));

        // Assert
        assert_eq!(removed, 1);
        assert!(store.get_session(&code).is_none());
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_sweep_only_removes_old_sessions() {
        let mut store = SessionStore::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let old = store.create_session_at(SERVER, MOBILE, t0);
        let fresh = store.create_session_at(SERVER, MOBILE, t0 + Duration::from_secs(20 * 3600));

        store.clean_expired_sessions_at(t0 + SESSION_TTL + minutes(1));

        if old != fresh {
            assert!(store.get_session(&old).is_none());
        }
        assert!(store.get_session(&fresh).is_some());
    }

    #[test]
    fn test_session_from_the_future_is_not_expired() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let session = Session {
            code: "ABCDEF".to_string(),
            server_url: SERVER.to_string(),
            mobile_url: MOBILE.to_string(),
            created_at: t0 + SESSION_TTL * 2,
        };

        assert!(!session.is_expired_at(t0));
    }
}
