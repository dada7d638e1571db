//! Session and identity state of one admin-panel visitor.
//!
//! The identity is a small state machine driven only by auth events. It is
//! stored in the visitor's cookie session and passed explicitly to whatever
//! needs it; nothing here is global.
//!
//! ```text
//! Unknown ──InitialSession(None)──▶ Anonymous
//!    │                                  │
//!    └──InitialSession(Some) / SignedIn─┴──▶ Member | Admin  (profile lookup)
//!
//! Member | Admin ──TokenRefreshed──▶ Member | Admin  (profile reloaded)
//! any ──SignedOut──▶ Anonymous
//! ```

use chrono::{DateTime, Duration, Utc};
use proglearn_backend::{AuthGateway, AuthSession, BackendError};
use proglearn_core::{Email, Profile, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Tokens expiring within this window are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Events that move the identity between states.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// First resolution of a visit, with whatever session was stored.
    InitialSession(Option<AuthSession>),
    SignedIn(AuthSession),
    SignedOut,
    TokenRefreshed(AuthSession),
}

/// Who the visitor is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IdentityState {
    /// Not resolved yet.
    #[default]
    Unknown,
    Anonymous,
    /// Signed in without admin rights, or the profile could not be loaded.
    Member {
        session: AuthSession,
        profile: Option<Profile>,
    },
    Admin {
        session: AuthSession,
        profile: Profile,
    },
}

/// The visitor's identity plus the initial-loading flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    state: IdentityState,
    loading: bool,
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl Identity {
    /// An unresolved identity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: IdentityState::Unknown,
            loading: true,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &IdentityState {
        &self.state
    }

    /// True until the first auth event has been handled.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.state, IdentityState::Admin { .. })
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match &self.state {
            IdentityState::Member { session, .. } | IdentityState::Admin { session, .. } => {
                Some(session)
            }
            IdentityState::Unknown | IdentityState::Anonymous => None,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        match &self.state {
            IdentityState::Member { profile, .. } => profile.as_ref(),
            IdentityState::Admin { profile, .. } => Some(profile),
            IdentityState::Unknown | IdentityState::Anonymous => None,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session().map(|s| s.user.id)
    }

    /// Profile name, else the account email.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.profile()
            .and_then(|p| p.name.clone())
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.session().and_then(|s| s.user.email.clone()))
    }

    /// Apply an auth event.
    ///
    /// Events carrying a session (re)load the profile; a failed lookup
    /// leaves the visitor signed in as a member.
    #[instrument(skip_all, fields(event = event.name()))]
    pub async fn handle<G>(&mut self, event: AuthEvent, gateway: &G)
    where
        G: AuthGateway + ?Sized,
    {
        self.state = match event {
            AuthEvent::InitialSession(None) | AuthEvent::SignedOut => IdentityState::Anonymous,
            AuthEvent::InitialSession(Some(session))
            | AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session) => Self::resolve(session, gateway).await,
        };
        self.loading = false;
    }

    async fn resolve<G>(session: AuthSession, gateway: &G) -> IdentityState
    where
        G: AuthGateway + ?Sized,
    {
        match gateway.fetch_profile(&session).await {
            Ok(profile) if profile.is_admin() => IdentityState::Admin { session, profile },
            Ok(profile) => {
                debug!(user_id = %session.user.id, "Signed in without admin role");
                IdentityState::Member {
                    session,
                    profile: Some(profile),
                }
            }
            Err(err) => {
                warn!(user_id = %session.user.id, error = %err, "Failed to load profile");
                IdentityState::Member {
                    session,
                    profile: None,
                }
            }
        }
    }

    /// Resolve a fresh visit that has no stored identity yet.
    pub async fn resolve_initial<G>(&mut self, gateway: &G)
    where
        G: AuthGateway + ?Sized,
    {
        if self.loading {
            self.handle(AuthEvent::InitialSession(None), gateway).await;
        }
    }

    /// Sign in with email and password.
    ///
    /// On failure the identity is left as it was (resolved to anonymous if
    /// it was still unknown).
    ///
    /// # Errors
    ///
    /// Returns the backend error, whose message is fit to show on the form.
    pub async fn sign_in<G>(
        &mut self,
        gateway: &G,
        email: &Email,
        password: &SecretString,
    ) -> Result<(), BackendError>
    where
        G: AuthGateway + ?Sized,
    {
        match gateway.sign_in_with_password(email, password).await {
            Ok(session) => {
                self.handle(AuthEvent::SignedIn(session), gateway).await;
                info!(admin = self.is_admin(), "Signed in");
                Ok(())
            }
            Err(err) => {
                if self.loading {
                    self.handle(AuthEvent::InitialSession(None), gateway).await;
                }
                Err(err)
            }
        }
    }

    /// Sign out.
    ///
    /// The identity becomes anonymous even if revoking the token fails.
    ///
    /// # Errors
    ///
    /// Returns the revocation error after signing out locally.
    pub async fn sign_out<G>(&mut self, gateway: &G) -> Result<(), BackendError>
    where
        G: AuthGateway + ?Sized,
    {
        let revoked = match self.session() {
            Some(session) => gateway.sign_out(&session.access_token).await,
            None => Ok(()),
        };
        self.handle(AuthEvent::SignedOut, gateway).await;
        revoked
    }

    /// Refresh the access token if it expires within [`REFRESH_MARGIN_SECS`].
    ///
    /// Returns whether a refresh happened. A rejected refresh signs the
    /// visitor out.
    ///
    /// # Errors
    ///
    /// Returns the refresh error after signing out locally.
    pub async fn refresh_if_expiring<G>(
        &mut self,
        gateway: &G,
        now: DateTime<Utc>,
    ) -> Result<bool, BackendError>
    where
        G: AuthGateway + ?Sized,
    {
        let Some(session) = self.session() else {
            return Ok(false);
        };
        if !session.expires_within(Duration::seconds(REFRESH_MARGIN_SECS), now) {
            return Ok(false);
        }

        match gateway.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                self.handle(AuthEvent::TokenRefreshed(fresh), gateway).await;
                Ok(true)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, signing out");
                self.handle(AuthEvent::SignedOut, gateway).await;
                Err(err)
            }
        }
    }
}

impl AuthEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::InitialSession(_) => "initial_session",
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
        }
    }
}
