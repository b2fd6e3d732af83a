//! Error types for sessiond

use thiserror::Error;

/// Authentication failure returned by [`SessionManager::authenticate`].
///
/// Expired and never-issued tokens both surface as `SessionNotFound`; callers
/// cannot tell them apart.
///
/// [`SessionManager::authenticate`]: crate::session::SessionManager::authenticate
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No cookie or an empty token was supplied
    #[error("missing session credential")]
    MissingCredential,

    /// Token is not in the store (unknown, expired or logged out)
    #[error("session not found")]
    SessionNotFound,
}

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_wraps_into_core_error() {
        let err: CoreError = AuthError::SessionNotFound.into();
        assert!(matches!(err, CoreError::Auth(AuthError::SessionNotFound)));
        assert_eq!(err.to_string(), "Authentication error: session not found");
    }
}
