//! Password sign-in and token management against the auth service.

use chrono::{DateTime, Duration, Utc};
use proglearn_core::{Email, Profile, UserId};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::client::BackendClient;
use crate::error::BackendError;

/// The user an auth session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by the auth service.
///
/// Serializable so it can live in a server-side session; the tokens stay
/// redacted in `Debug` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(serialize_with = "expose")]
    pub access_token: SecretString,
    #[serde(serialize_with = "expose")]
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Whether the access token expires within `margin` of `now`.
    #[must_use]
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= margin
    }
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Lifetime in seconds.
    expires_in: i64,
    /// Absolute expiry (Unix seconds), when the service sends it.
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, issued_at: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| issued_at + Duration::seconds(self.expires_in));

        AuthSession {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

impl BackendClient {
    /// Exchange an email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns a `Rejected` error carrying the service's message when the
    /// credentials are wrong.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint(&["auth", "v1", "token"]);
        url.query_pairs_mut().append_pair("grant_type", "password");

        let issued_at = Utc::now();
        let request = self.anon_request(Method::POST, url).json(&PasswordGrant {
            email: email.as_str(),
            password: password.expose_secret(),
        });
        let response: TokenResponse = self.send_json(request).await?;
        let session = response.into_session(issued_at);
        debug!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Trade a refresh token for a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token was revoked or already used.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint(&["auth", "v1", "token"]);
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let issued_at = Utc::now();
        let request = self.anon_request(Method::POST, url).json(&RefreshGrant {
            refresh_token: refresh_token.expose_secret(),
        });
        let response: TokenResponse = self.send_json(request).await?;
        let session = response.into_session(issued_at);
        debug!(user_id = %session.user.id, expires_at = %session.expires_at, "Session refreshed");
        Ok(session)
    }

    /// Revoke the session owning `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError> {
        let url = self.endpoint(&["auth", "v1", "logout"]);
        let request = self.authorized(access_token.clone()).request(Method::POST, url);
        self.send_empty(request).await
    }

    /// The user owning `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the token is invalid or expired.
    #[instrument(skip(self, access_token))]
    pub async fn get_user(&self, access_token: &SecretString) -> Result<AuthUser, BackendError> {
        let url = self.endpoint(&["auth", "v1", "user"]);
        let request = self.authorized(access_token.clone()).request(Method::GET, url);
        self.send_json(request).await
    }

    /// The profile row of a user, read with that user's token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no profile.
    #[instrument(skip(self, session), fields(user_id = %session.user.id))]
    pub async fn fetch_profile(&self, session: &AuthSession) -> Result<Profile, BackendError> {
        let filter = format!("eq.{}", session.user.id);
        let url = self.table_url("profiles", &[("select", "*"), ("id", &filter)]);
        let request = self
            .authorized(session.access_token.clone())
            .request(Method::GET, url);
        self.send_single(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn token_response(expires_at: Option<i64>) -> TokenResponse {
        serde_json::from_value(json!({
            "access_token": "access",
            "token_type": "bearer",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "expires_at": expires_at,
            "user": { "id": "6f1c2a8e-7f38-4a3f-9d55-3b1f0a4c8e21", "email": "ada@proglearn.dev" }
        }))
        .unwrap()
    }

    #[test]
    fn test_expiry_from_lifetime() {
        let issued = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let session = token_response(None).into_session(issued);
        assert_eq!(session.expires_at, issued + Duration::hours(1));
        assert_eq!(session.user.email.as_deref(), Some("ada@proglearn.dev"));
    }

    #[test]
    fn test_expiry_prefers_absolute_timestamp() {
        let issued = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let absolute = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let session = token_response(Some(absolute.timestamp())).into_session(issued);
        assert_eq!(session.expires_at, absolute);
    }

    #[test]
    fn test_expires_within() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut session = token_response(None).into_session(now);

        assert!(!session.expires_within(Duration::seconds(60), now));
        session.expires_at = now + Duration::seconds(30);
        assert!(session.expires_within(Duration::seconds(60), now));
    }

    #[test]
    fn test_session_serializes_tokens_but_debug_redacts() {
        let session = token_response(None).into_session(Utc::now());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["access_token"], "access");

        let restored: AuthSession = serde_json::from_value(json).unwrap();
        assert_eq!(restored.refresh_token.expose_secret(), "refresh");
        assert!(!format!("{restored:?}").contains("refresh\""));
    }
}
