//! Authentication route handlers for admin.
//!
//! Email and password sign-in against the auth service. Only accounts whose
//! profile carries the admin role get past the login page.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use proglearn_core::Email;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::render;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{load_identity, store_identity};
use crate::state::AppState;

const NOT_AN_ADMIN: &str = "This account does not have admin access.";

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    error: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", axum::routing::post(logout))
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(Query(query): Query<LoginQuery>) -> Response {
    render(&LoginPageTemplate {
        email: String::new(),
        error: query.error.filter(|e| !e.trim().is_empty()),
    })
}

/// Sign in with email and password.
///
/// POST /auth/login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let failed = |email: String, error: String| {
        let mut response = render(&LoginPageTemplate {
            email,
            error: Some(error),
        });
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        response
    };

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(failed(form.email, "Enter a valid email address.".to_string()));
    };
    let password = SecretString::from(form.password);

    let mut identity = load_identity(&session).await;
    if let Err(err) = identity.sign_in(state.backend(), &email, &password).await {
        tracing::info!(error = %err, "Sign-in rejected");
        return Ok(failed(email.into_inner(), err.message));
    }

    if !identity.is_admin() {
        tracing::warn!(email = %email, "Sign-in without admin role");
        if let Err(err) = identity.sign_out(state.backend()).await {
            tracing::debug!(error = %err, "Failed to revoke member session");
        }
        store_identity(&session, &identity).await?;
        return Ok(failed(email.into_inner(), NOT_AN_ADMIN.to_string()));
    }

    // New session id on privilege change
    session.cycle_id().await?;
    store_identity(&session, &identity).await?;
    if let Some(user_id) = identity.user_id() {
        set_sentry_user(&user_id, Some(email.as_str()));
    }
    tracing::info!("Admin signed in");
    Ok(Redirect::to("/").into_response())
}

/// Sign out and clear the session.
///
/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut identity = load_identity(&session).await;
    if let Some(user_id) = identity.user_id() {
        state.editors().remove(user_id);
    }
    if let Err(err) = identity.sign_out(state.backend()).await {
        tracing::warn!(error = %err, "Failed to revoke session token");
    }
    session.flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_shows_error() {
        let html = LoginPageTemplate {
            email: "ada@proglearn.dev".to_string(),
            error: Some(NOT_AN_ADMIN.to_string()),
        }
        .render()
        .unwrap();

        assert!(html.contains(NOT_AN_ADMIN));
        assert!(html.contains("value=\"ada@proglearn.dev\""));
    }
}
