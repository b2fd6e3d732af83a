//! Configuration management for sessiond
//!
//! Loads settings from TOML file at ~/.sessiond/config.toml

use crate::error::{CoreError, Result};
use crate::session::{SessionOptions, DEFAULT_COOKIE_NAME, DEFAULT_MAX_LIFETIME_SECS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,

    /// Optional API key guarding session issuance
    /// Required in Authorization header if set: "Authorization: Bearer <key>"
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
            api_key: None,
        }
    }
}

/// Session cookie and expiry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name (default: "session")
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Idle lifetime in seconds before a session is swept (default: 600)
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,

    /// Sweep cadence in milliseconds (default: 1000)
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Add the Secure attribute to session cookies.
    /// Off by default; turn on when served over HTTPS.
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_max_lifetime_secs() -> u64 {
    DEFAULT_MAX_LIFETIME_SECS
}

fn default_sweep_interval_ms() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: default_cookie_name(),
            max_lifetime_secs: default_max_lifetime_secs(),
            sweep_interval_ms: default_sweep_interval_ms(),
            secure_cookie: false,
        }
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        SessionOptions::new(config.cookie_name.clone(), config.max_lifetime_secs)
            .with_sweep_interval(Duration::from_millis(config.sweep_interval_ms))
            .with_secure_cookie(config.secure_cookie)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Session manager options derived from the `[session]` table
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::from(&self.session)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SESSIOND_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SESSIOND_SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(key) = std::env::var("SESSIOND_SERVER_API_KEY") {
            self.server.api_key = if key.is_empty() { None } else { Some(key) };
        }
        if let Ok(name) = std::env::var("SESSIOND_COOKIE_NAME") {
            self.session.cookie_name = name;
        }
        if let Ok(secs) = std::env::var("SESSIOND_MAX_LIFETIME_SECS") {
            if let Ok(secs) = secs.parse() {
                self.session.max_lifetime_secs = secs;
            }
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# sessiond configuration

[server]
# Port to listen on (default: 8080)
port = 8080

# Host to bind to
# "127.0.0.1" = localhost only (recommended)
host = "127.0.0.1"

# Optional API key required to issue sessions
# If set, clients must send: Authorization: Bearer <api_key>
# api_key = "your-secret-key"

[session]
# Name of the session cookie
cookie_name = "session"

# Seconds of inactivity before a session is removed (also the cookie Max-Age)
max_lifetime_secs = 600

# How often expired sessions are swept, in milliseconds
sweep_interval_ms = 1000

# Mark cookies Secure (enable when served over HTTPS)
secure_cookie = false
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
