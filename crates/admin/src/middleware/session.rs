//! Session middleware configuration for admin.
//!
//! Sessions live in process memory with strict cookie settings
//! (SameSite=Strict, HTTP-only, 24 hour inactivity expiry). Restarting the
//! panel signs everyone out.

use std::time::Duration;

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::AdminConfig;
use crate::models::{Flash, session_keys};
use crate::services::Identity;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "proglearn_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Inactivity after which a session, and the admin's editor, is gone.
pub const SESSION_EXPIRY: Duration = Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs());

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// The stored identity, or a fresh unresolved one.
pub async fn load_identity(session: &Session) -> Identity {
    match session.get::<Identity>(session_keys::IDENTITY).await {
        Ok(Some(identity)) => identity,
        Ok(None) => Identity::new(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read identity from session");
            Identity::new()
        }
    }
}

/// Persist the identity.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_identity(
    session: &Session,
    identity: &Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::IDENTITY, identity).await
}

/// Queue a message for the next page view.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the pending message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
