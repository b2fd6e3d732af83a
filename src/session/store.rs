//! In-memory session store.
//!
//! One reader/writer lock guards every entry. Anything that mutates an entry,
//! including the activity refresh inside [`SessionStore::get`], takes the
//! write lock for the whole read-modify-write step.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::types::{CookieSettings, Session, SessionOptions, SessionToken};

/// Live entry: the session plus a monotonic activity stamp used for expiry.
struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    fn touch(&mut self) {
        self.last_seen = self.last_seen.max(Instant::now());
        self.session.touch();
    }

    /// `last_seen + cutoff < now`
    fn is_stale(&self, now: Instant, cutoff: Duration) -> bool {
        self.last_seen
            .checked_add(cutoff)
            .is_some_and(|deadline| deadline < now)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<SessionToken, Entry>,
    expired_total: u64,
    last_sweep_at: Option<DateTime<Utc>>,
}

/// Point-in-time counters for the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub active_sessions: usize,
    pub expired_total: u64,
    pub last_sweep_at: Option<DateTime<Utc>>,
}

/// Concurrent registry of live sessions.
pub struct SessionStore {
    inner: RwLock<Inner>,
    cookie: CookieSettings,
    max_lifetime: Duration,
    sweep_interval: Duration,
}

impl SessionStore {
    pub fn new(options: &SessionOptions) -> Self {
        SessionStore {
            inner: RwLock::new(Inner::default()),
            cookie: options.cookie_settings(),
            max_lifetime: options.max_lifetime(),
            sweep_interval: options.sweep_interval,
        }
    }

    pub fn max_lifetime(&self) -> Duration {
        self.max_lifetime
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn cookie_settings(&self) -> &CookieSettings {
        &self.cookie
    }

    /// Create a session for `user_id` with a fresh token.
    pub fn create(&self, user_id: i64) -> Session {
        let mut inner = self.inner.write();

        let mut token = SessionToken::generate();
        while inner.entries.contains_key(&token) {
            token = SessionToken::generate();
        }

        let session = Session::new(token.clone(), user_id, self.cookie.clone());
        inner.entries.insert(
            token,
            Entry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        drop(inner);

        debug!(user_id, "Session created");
        session
    }

    /// Look up a session and refresh its activity in one step.
    ///
    /// Entries leave the store only through `delete` or a sweep, so a hit
    /// always refreshes, even on an entry the next sweep would have taken.
    pub fn get(&self, token: &str) -> Option<Session> {
        let mut inner = self.inner.write();
        let entry = inner.entries.get_mut(token)?;
        entry.touch();
        Some(entry.session.clone())
    }

    /// Read a session without refreshing it.
    pub fn peek(&self, token: &str) -> Option<Session> {
        self.inner
            .read()
            .entries
            .get(token)
            .map(|entry| entry.session.clone())
    }

    /// Remove a session. Removing an absent token is a no-op.
    pub fn delete(&self, token: &str) -> bool {
        self.inner.write().entries.remove(token).is_some()
    }

    /// Remove every session that belongs to `user_id`.
    pub fn delete_by_user(&self, user_id: i64) -> usize {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| entry.session.user_id() != user_id);
        before - inner.entries.len()
    }

    /// Remove every session whose last activity is more than `cutoff` ago.
    ///
    /// The whole scan runs under the write lock. Returns the number removed.
    pub fn expire_older_than(&self, cutoff: Duration) -> usize {
        let mut inner = self.inner.write();
        let now = Instant::now();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_stale(now, cutoff));
        let expired = before - inner.entries.len();

        inner.expired_total += expired as u64;
        inner.last_sweep_at = Some(Utc::now());
        expired
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            active_sessions: inner.entries.len(),
            expired_total: inner.expired_total,
            last_sweep_at: inner.last_sweep_at,
        }
    }
}
