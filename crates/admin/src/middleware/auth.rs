//! Authentication extractor for admin routes.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use proglearn_backend::{AuthSession, BackendClient};
use proglearn_core::{Profile, UserId};
use tower_sessions::Session;

use super::session::{load_identity, store_identity};
use crate::error::set_sentry_user;
use crate::services::{EditorSession, Identity};
use crate::state::AppState;

/// Everything an admin handler acts with.
pub struct AdminContext {
    pub user_id: UserId,
    pub profile: Profile,
    pub display_name: String,
    /// Backend client carrying the admin's access token.
    pub client: Arc<BackendClient>,
    /// The admin's lesson editor.
    pub editor: Arc<EditorSession<BackendClient>>,
    pub session: Session,
}

/// Extractor that requires a signed-in admin.
///
/// Signed-out visitors and members without the admin role are redirected
/// to the login page, or get 401 Unauthorized on `/api/` routes.
pub struct RequireAdminAuth(pub AdminContext);

/// Error returned when admin authentication is required but missing.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let reject = if parts.uri.path().starts_with("/api/") {
            AdminAuthRejection::Unauthorized
        } else {
            AdminAuthRejection::RedirectToLogin
        };

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let mut identity = load_identity(&session).await;
        let signed_in_as = identity.user_id();
        let mut changed = identity.is_loading();
        identity.resolve_initial(state.backend()).await;
        match identity.refresh_if_expiring(state.backend(), Utc::now()).await {
            Ok(refreshed) => changed |= refreshed,
            Err(err) => {
                tracing::debug!(error = %err, "Session expired");
                changed = true;
            }
        }
        if changed {
            if let Err(err) = store_identity(&session, &identity).await {
                tracing::warn!(error = %err, "Failed to store identity");
            }
        }
        close_lost_editor(state, signed_in_as, &identity);

        let context = admin_context(&identity, state, session).ok_or(reject)?;
        Ok(Self(context))
    }
}

/// Drop the editor of an admin whose session ended or who lost the role.
fn close_lost_editor(state: &AppState, signed_in_as: Option<UserId>, identity: &Identity) {
    let Some(user) = signed_in_as else {
        return;
    };
    if !identity.is_admin() || identity.user_id() != Some(user) {
        state.editors().remove(user);
    }
}

fn admin_context(identity: &Identity, state: &AppState, session: Session) -> Option<AdminContext> {
    if !identity.is_admin() {
        return None;
    }
    let auth: &AuthSession = identity.session()?;
    let profile = identity.profile()?.clone();
    let display_name = identity
        .display_name()
        .unwrap_or_else(|| "Admin".to_string());

    let client = Arc::new(state.backend().authorized(auth.access_token.clone()));
    let editor = state.editors().session(auth.user.id, Arc::clone(&client));
    set_sentry_user(&auth.user.id, auth.user.email.as_deref());

    Some(AdminContext {
        user_id: auth.user.id,
        profile,
        display_name,
        client,
        editor,
        session,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::services::AuthEvent;
    use crate::services::identity::tests::{FakeAuth, session};
    use proglearn_core::ProfileRole;

    async fn signed_in_admin(gateway: &FakeAuth, expires_in: chrono::Duration) -> Identity {
        let mut identity = Identity::new();
        identity
            .handle(AuthEvent::SignedIn(session("access", Utc::now() + expires_in)), gateway)
            .await;
        assert!(identity.is_admin());
        identity
    }

    fn open_editor(state: &AppState, user: UserId) {
        state
            .editors()
            .session(user, Arc::new(state.backend().clone()));
        assert!(state.editors().contains(user));
    }

    #[tokio::test]
    async fn test_rejected_refresh_closes_editor() {
        let state = AppState::new(test_config("http://127.0.0.1:9")).unwrap();
        let mut gateway = FakeAuth::new(Some(ProfileRole::Admin));
        gateway.refresh_ok = false;
        let mut identity = signed_in_admin(&gateway, chrono::Duration::seconds(5)).await;
        let user = identity.user_id().unwrap();
        open_editor(&state, user);

        assert!(identity.refresh_if_expiring(&gateway, Utc::now()).await.is_err());
        close_lost_editor(&state, Some(user), &identity);

        assert!(!state.editors().contains(user));
    }

    #[tokio::test]
    async fn test_active_admin_keeps_editor() {
        let state = AppState::new(test_config("http://127.0.0.1:9")).unwrap();
        let gateway = FakeAuth::new(Some(ProfileRole::Admin));
        let identity = signed_in_admin(&gateway, chrono::Duration::hours(1)).await;
        let user = identity.user_id().unwrap();
        open_editor(&state, user);

        close_lost_editor(&state, Some(user), &identity);

        assert!(state.editors().contains(user));
    }

    #[tokio::test]
    async fn test_lost_admin_role_closes_editor() {
        let state = AppState::new(test_config("http://127.0.0.1:9")).unwrap();
        let admin = FakeAuth::new(Some(ProfileRole::Admin));
        let mut identity = signed_in_admin(&admin, chrono::Duration::hours(1)).await;
        let user = identity.user_id().unwrap();
        open_editor(&state, user);

        let demoted = FakeAuth::new(Some(ProfileRole::Member));
        identity
            .handle(AuthEvent::TokenRefreshed(session("fresh", Utc::now())), &demoted)
            .await;
        close_lost_editor(&state, Some(user), &identity);

        assert!(!state.editors().contains(user));
    }
}
