//! Cookie session management.
//!
//! In-memory session store with TTL expiry driven by a background sweeper,
//! wrapped by a manager that owns the sweeper's lifecycle.

pub mod manager;
pub mod store;
pub mod sweeper;
pub mod types;

pub use manager::SessionManager;
pub use store::{SessionStore, StoreStats};
pub use sweeper::Sweeper;
pub use types::{
    CookieDescriptor, CookieSettings, Session, SessionOptions, SessionToken, DEFAULT_COOKIE_NAME,
    DEFAULT_MAX_LIFETIME_SECS, DEFAULT_SWEEP_INTERVAL,
};
