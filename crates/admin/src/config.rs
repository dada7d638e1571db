//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_URL` - Base URL of the backend service
//! - `BACKEND_ANON_KEY` - Public (anonymous) API key
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_AUTOSAVE_SECS` - Autosave interval in seconds (default: 30)
//! - `ADMIN_MAX_UPLOAD_BYTES` - Largest accepted upload (default: 10 MiB)
//! - `BACKEND_MEDIA_BUCKET` - Storage bucket for media (default: lesson-media)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Environment name reported to Sentry
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use proglearn_backend::BackendConfig;
use thiserror::Error;

const DEFAULT_AUTOSAVE_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error(transparent)]
    Backend(#[from] proglearn_backend::ConfigError),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Backend service connection
    pub backend: BackendConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// How often open editors are autosaved
    pub autosave_interval: Duration,
    /// Largest media or import upload accepted
    pub max_upload_bytes: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
}

impl AdminConfig {
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

        let backend = BackendConfig::from_env()?;
        let host = parse_env("ADMIN_HOST", "127.0.0.1".parse::<IpAddr>().ok())?;
        let port = parse_env("ADMIN_PORT", Some(3001_u16))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        let autosave_secs = parse_env("ADMIN_AUTOSAVE_SECS", Some(DEFAULT_AUTOSAVE_SECS))?;
        if autosave_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_AUTOSAVE_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let max_upload_bytes = parse_env("ADMIN_MAX_UPLOAD_BYTES", Some(DEFAULT_MAX_UPLOAD_BYTES))?;

        Ok(Self {
            backend,
            host,
            port,
            base_url,
            autosave_interval: Duration::from_secs(autosave_secs),
            max_upload_bytes,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", Some(1.0))?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", Some(0.0))?,
            json_logs: get_optional_env("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the panel is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use secrecy::SecretString;

    /// A configuration pointing at `backend_url`, for tests.
    pub fn test_config(backend_url: &str) -> AdminConfig {
        AdminConfig {
            backend: BackendConfig {
                url: backend_url.parse().unwrap(),
                anon_key: SecretString::from("anon-key-value"),
                media_bucket: "lesson-media".to_string(),
            },
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            autosave_interval: Duration::from_secs(30),
            max_upload_bytes: 1024,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            json_logs: false,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config("http://localhost:54321");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert!(!config.is_secure());
        assert!(!format!("{config:?}").contains("anon-key-value"));
    }

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: u64 = parse_env("PROGLEARN_TEST_UNSET_NUMBER", Some(7)).unwrap();
        assert_eq!(value, 7);

        let missing: Result<u64, _> = parse_env("PROGLEARN_TEST_UNSET_NUMBER", None);
        assert!(matches!(missing, Err(ConfigError::MissingEnvVar(_))));
    }
}
