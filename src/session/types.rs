//! Session entity, token and cookie descriptor types.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

/// Default cookie name
pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Default maximum idle lifetime of a session (10 minutes)
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 10 * 60;

/// Default sweep cadence
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(1000);

/// Opaque session token.
///
/// Lower-case hex: 16 digits of nanoseconds since the Unix epoch followed by
/// 32 digits drawn from the thread-local random generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a new token.
    pub fn generate() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let random: u128 = rand::random();
        Self(format!("{:016x}{:032x}", nanos, random))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cookie attributes a session captures when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

/// Options for starting a [`SessionManager`](super::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Maximum idle lifetime in seconds, also used as the cookie Max-Age
    pub max_lifetime_secs: u64,
    /// How often the sweeper runs
    pub sweep_interval: Duration,
    /// Emit the `Secure` attribute on issued cookies
    pub secure_cookie: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            max_lifetime_secs: DEFAULT_MAX_LIFETIME_SECS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            secure_cookie: false,
        }
    }
}

impl SessionOptions {
    pub fn new(cookie_name: impl Into<String>, max_lifetime_secs: u64) -> Self {
        SessionOptions {
            cookie_name: cookie_name.into(),
            max_lifetime_secs,
            ..Default::default()
        }
    }

    /// Override the sweep cadence (mostly useful in tests).
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            name: self.cookie_name.clone(),
            max_age_secs: self.max_lifetime_secs,
            secure: self.secure_cookie,
        }
    }

    /// Reject options the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(CoreError::Config("cookie name must not be empty".into()));
        }
        if !self.cookie_name.bytes().all(is_cookie_name_byte) {
            return Err(CoreError::Config(format!(
                "invalid cookie name: {:?}",
                self.cookie_name
            )));
        }
        if self.max_lifetime_secs == 0 {
            return Err(CoreError::Config(
                "max lifetime must be greater than zero".into(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CoreError::Config(
                "sweep interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// RFC 6265 token characters (visible ASCII minus separators).
fn is_cookie_name_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

/// A server-side session binding a token to an authenticated user.
///
/// Values handed out by the store are snapshots; the store owns the live copy
/// and is the only place `last_active` changes.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    token: SessionToken,
    user_id: i64,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
    #[serde(skip)]
    cookie: CookieSettings,
}

impl Session {
    pub(crate) fn new(token: SessionToken, user_id: i64, cookie: CookieSettings) -> Self {
        let now = Utc::now();
        Session {
            token,
            user_id,
            created_at: now,
            last_active: now,
            cookie,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Refresh `last_active`; never moves it backward.
    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        if now > self.last_active {
            self.last_active = now;
        }
    }

    /// Cookie carrying this session's token.
    pub fn cookie_descriptor(&self) -> CookieDescriptor {
        CookieDescriptor {
            name: self.cookie.name.clone(),
            value: self.token.to_string(),
            path: "/".to_string(),
            http_only: true,
            max_age_secs: self.cookie.max_age_secs,
            secure: self.cookie.secure,
        }
    }
}

/// Attributes of a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieDescriptor {
    pub name: String,
    pub value: String,
    pub path: String,
    pub http_only: bool,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl CookieDescriptor {
    /// A descriptor that tells the client to drop the cookie.
    pub fn expired(settings: &CookieSettings) -> Self {
        CookieDescriptor {
            name: settings.name.clone(),
            value: String::new(),
            path: "/".to_string(),
            http_only: true,
            max_age_secs: 0,
            secure: settings.secure,
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Path={}; Max-Age={}",
            self.name, self.value, self.path, self.max_age_secs
        );
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

impl fmt::Display for CookieDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}
