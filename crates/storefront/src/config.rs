//! Commerce core configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIDEPOOL_PRODUCTS_API_URL` - Base URL of the read-only catalogue store
//!
//! ## Optional
//! - `TIDEPOOL_USER_API_URL` - Base URL of the user-record store
//!   (default: `http://localhost:4000/users`)
//! - `TIDEPOOL_SESSION_TTL_SECS` - Session time-to-live in seconds
//!   (default: 60)
//! - `TIDEPOOL_SESSION_POLL_SECS` - Expiry watchdog poll interval in seconds
//!   (default: 1)
//! - `TIDEPOOL_SESSION_DIR` - Directory for durable session storage
//!   (default: `.tidepool`)
//! - `TIDEPOOL_LOGIN_PATH` - Path expired sessions are directed to
//!   (default: `/login`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Fallback user-record store, matching the local development stack.
const DEFAULT_USER_API_URL: &str = "http://localhost:4000/users";

/// Reference session window; tune per deployment.
const DEFAULT_SESSION_TTL_SECS: u64 = 60;

const DEFAULT_SESSION_POLL_SECS: u64 = 1;
const DEFAULT_SESSION_DIR: &str = ".tidepool";
const DEFAULT_LOGIN_PATH: &str = "/login";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Commerce state core configuration.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Base URL of the user-record store (`GET`/`PATCH /users/{id}`).
    pub user_api_url: String,
    /// Base URL of the catalogue store (`GET /products`).
    pub products_api_url: String,
    /// Fixed window after which an authenticated session expires.
    pub session_ttl: Duration,
    /// Poll interval of the session-expiry watchdog.
    pub session_poll_interval: Duration,
    /// Directory holding the durable session storage files.
    pub session_dir: PathBuf,
    /// Login entry point expired sessions navigate to.
    pub login_path: String,
}

impl CommerceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let user_api_url = get_env_or_default("TIDEPOOL_USER_API_URL", DEFAULT_USER_API_URL);
        validate_base_url("TIDEPOOL_USER_API_URL", &user_api_url)?;

        let products_api_url = get_required_env("TIDEPOOL_PRODUCTS_API_URL")?;
        validate_base_url("TIDEPOOL_PRODUCTS_API_URL", &products_api_url)?;

        let session_ttl = Duration::from_secs(get_env_secs(
            "TIDEPOOL_SESSION_TTL_SECS",
            DEFAULT_SESSION_TTL_SECS,
        )?);
        let session_poll_interval = Duration::from_secs(get_env_secs(
            "TIDEPOOL_SESSION_POLL_SECS",
            DEFAULT_SESSION_POLL_SECS,
        )?);

        let session_dir =
            PathBuf::from(get_env_or_default("TIDEPOOL_SESSION_DIR", DEFAULT_SESSION_DIR));
        let login_path = get_env_or_default("TIDEPOOL_LOGIN_PATH", DEFAULT_LOGIN_PATH);

        Ok(Self {
            user_api_url,
            products_api_url,
            session_ttl,
            session_poll_interval,
            session_dir,
            login_path,
        })
    }

    /// Build a configuration from explicit store URLs, with defaults for
    /// everything else. Intended for hosts that wire configuration
    /// themselves and for tests.
    #[must_use]
    pub fn new(user_api_url: impl Into<String>, products_api_url: impl Into<String>) -> Self {
        Self {
            user_api_url: user_api_url.into(),
            products_api_url: products_api_url.into(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            session_poll_interval: Duration::from_secs(DEFAULT_SESSION_POLL_SECS),
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a whole-seconds environment variable with a default value.
fn get_env_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

/// Validate that a configured base URL parses and has no trailing slash
/// (record URLs are built by appending `/{id}`).
fn validate_base_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if value.ends_with('/') {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not end with a trailing slash".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_accepts_http() {
        assert!(validate_base_url("TEST", "http://localhost:4000/users").is_ok());
        assert!(validate_base_url("TEST", "https://api.example.com/users").is_ok());
    }

    #[test]
    fn test_validate_base_url_rejects_garbage() {
        assert!(validate_base_url("TEST", "not a url").is_err());
        assert!(validate_base_url("TEST", "ftp://example.com").is_err());
        assert!(validate_base_url("TEST", "http://localhost:4000/users/").is_err());
    }

    #[test]
    fn test_get_env_secs_default() {
        assert_eq!(
            get_env_secs("TIDEPOOL_TEST_UNSET_SECS", 60).unwrap(),
            60
        );
    }

    #[test]
    fn test_new_defaults() {
        let config = CommerceConfig::new(
            "http://localhost:4000/users",
            "http://localhost:4100/products",
        );

        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.session_poll_interval, Duration::from_secs(1));
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.session_dir, PathBuf::from(".tidepool"));
    }
}
