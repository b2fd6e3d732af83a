//! sessiond - in-memory cookie sessions with TTL sweeping
//!
//! This crate provides:
//! - A concurrent session store keyed by opaque tokens
//! - A background sweeper that evicts idle sessions
//! - A manager owning the sweeper lifecycle and the create/authenticate API
//! - A small HTTP API that hands sessions out as cookies
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use sessiond::session::{SessionManager, SessionOptions};
//!
//! let sessions = SessionManager::start(SessionOptions::new("session", 600))?;
//! let session = sessions.create(user_id);
//! let cookie = sessions.cookie_descriptor_for(&session);
//! // later, on another request
//! let session = sessions.authenticate(&cookie_value)?;
//! sessions.stop().await;
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! sessiond --config ~/.sessiond/config.toml
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;

// Re-export main types for convenience
pub use config::Config;
pub use error::{AuthError, CoreError, Result};
pub use session::{CookieDescriptor, Session, SessionManager, SessionOptions};

use std::sync::Arc;

/// Core service: configuration plus the running session manager
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Session manager (sweeper already running)
    sessions: Arc<SessionManager>,
}

impl Core {
    /// Create a new Core instance and start sweeping sessions.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        let sessions = SessionManager::start(config.session_options())?;
        Ok(Core {
            config,
            sessions: Arc::new(sessions),
        })
    }

    /// Get the session manager
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Start the HTTP API server (blocks until shutdown signal)
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!("Starting API server on {}", addr);
        api::serve(addr, self.sessions.clone(), &self.config).await
    }

    /// Stop background work
    pub async fn shutdown(&self) {
        self.sessions.stop().await;
    }
}
