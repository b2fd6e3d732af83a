//! Session manager: owns the store, runs the sweeper and exposes the
//! create/authenticate contract used by request handlers.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::store::{SessionStore, StoreStats};
use super::sweeper::Sweeper;
use super::types::{CookieDescriptor, Session, SessionOptions};
use crate::error::{AuthError, Result};

/// Session lifecycle manager.
pub struct SessionManager {
    store: Arc<SessionStore>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl SessionManager {
    /// Build the store and start sweeping immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(options: SessionOptions) -> Result<Self> {
        options.validate()?;

        let store = Arc::new(SessionStore::new(&options));
        let sweeper = Sweeper::spawn(Arc::clone(&store));

        info!(
            cookie = %options.cookie_name,
            max_lifetime_secs = options.max_lifetime_secs,
            sweep_interval_ms = options.sweep_interval.as_millis() as u64,
            "Session manager started"
        );

        Ok(SessionManager {
            store,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    /// Stop the sweeper and wait for it to exit.
    ///
    /// Safe to call more than once and from several tasks at a time; only the
    /// first call does any work.
    pub async fn stop(&self) {
        let mut guard = self.sweeper.lock().await;
        if let Some(sweeper) = guard.take() {
            sweeper.stop().await;
            info!("Session manager stopped");
        }
    }

    /// Whether the sweeper is still running.
    pub async fn is_running(&self) -> bool {
        self.sweeper.lock().await.is_some()
    }

    /// Start a session for an already-authenticated user.
    pub fn create(&self, user_id: i64) -> Session {
        self.store.create(user_id)
    }

    /// Resolve a cookie value to its session, refreshing its activity.
    pub fn authenticate(&self, cookie_value: &str) -> std::result::Result<Session, AuthError> {
        if cookie_value.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        self.store.get(cookie_value).ok_or_else(|| {
            debug!("Rejected unknown or expired session token");
            AuthError::SessionNotFound
        })
    }

    /// Cookie that hands `session` to the client.
    pub fn cookie_descriptor_for(&self, session: &Session) -> CookieDescriptor {
        session.cookie_descriptor()
    }

    /// Cookie that clears the session cookie on the client.
    pub fn expired_cookie(&self) -> CookieDescriptor {
        CookieDescriptor::expired(self.store.cookie_settings())
    }

    pub fn cookie_name(&self) -> &str {
        &self.store.cookie_settings().name
    }

    /// End a single session. Returns false if it was already gone.
    pub fn logout(&self, token: &str) -> bool {
        self.store.delete(token)
    }

    /// End every session of `user_id`.
    pub fn logout_everywhere(&self, user_id: i64) -> usize {
        let removed = self.store.delete_by_user(user_id);
        info!(user_id, removed, "Logged out all sessions for user");
        removed
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}
