//! Admin sign-in for CLI commands.
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` - Base URL of the backend service
//! - `BACKEND_ANON_KEY` - Public (anonymous) API key

use proglearn_backend::{BackendClient, BackendConfig, BackendError};
use proglearn_core::{Email, EmailError};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while signing in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A credential was not given on the command line or in the environment.
    #[error("Missing {0}: pass --{0} or set {1}")]
    MissingCredential(&'static str, &'static str),

    /// Backend configuration is incomplete.
    #[error(transparent)]
    Config(#[from] proglearn_backend::ConfigError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend refused the request.
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// The account exists but is not an admin.
    #[error("{0} does not have admin access")]
    NotAdmin(String),
}

/// Sign in and return a client acting as that admin.
///
/// # Errors
///
/// Returns an error if credentials are missing or wrong, or if the account
/// is not an admin.
pub async fn sign_in(
    email: Option<&str>,
    password: Option<SecretString>,
) -> Result<BackendClient, AuthError> {
    let email = email.ok_or(AuthError::MissingCredential("email", "PROGLEARN_ADMIN_EMAIL"))?;
    let password =
        password.ok_or(AuthError::MissingCredential("password", "PROGLEARN_ADMIN_PASSWORD"))?;
    let email = Email::parse(email)?;

    let config = BackendConfig::from_env()?;
    let client = BackendClient::new(&config)?;

    tracing::info!(backend = %config.url, email = %email, "Signing in");
    let session = client.sign_in_with_password(&email, &password).await?;
    let profile = client.fetch_profile(&session).await?;
    if !profile.is_admin() {
        // Best effort; the token expires on its own.
        if let Err(err) = client.sign_out(&session.access_token).await {
            tracing::debug!(error = %err, "Sign-out after role check failed");
        }
        return Err(AuthError::NotAdmin(email.to_string()));
    }

    Ok(client.authorized(session.access_token))
}
