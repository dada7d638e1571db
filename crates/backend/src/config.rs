//! Backend connection settings shared by every binary.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_URL` - Base URL of the backend service (e.g. `https://xyz.example.co`)
//! - `BACKEND_ANON_KEY` - Public (anonymous) API key
//!
//! ## Optional
//! - `BACKEND_MEDIA_BUCKET` - Storage bucket for uploads (default: `lesson-media`)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default storage bucket for lesson media.
pub const DEFAULT_MEDIA_BUCKET: &str = "lesson-media";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the backend lives and how to identify to it.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, without the `/rest/v1` suffix
    pub url: Url,
    /// Anonymous API key, sent as `apikey` on every request
    pub anon_key: SecretString,
    /// Storage bucket for uploaded media
    pub media_bucket: String,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("media_bucket", &self.media_bucket)
            .finish()
    }
}

impl BackendConfig {
    /// Load the backend settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or the URL
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("BACKEND_URL")?;
        let url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string()))?;
        let anon_key = SecretString::from(get_required_env("BACKEND_ANON_KEY")?);
        let media_bucket = std::env::var("BACKEND_MEDIA_BUCKET")
            .ok()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MEDIA_BUCKET.to_string());

        Ok(Self {
            url,
            anon_key,
            media_bucket,
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
