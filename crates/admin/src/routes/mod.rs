//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//!
//! # Auth (email + password, admin role required)
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Sign in
//! POST /auth/logout                   - Sign out
//!
//! # Dashboard
//! GET  /                              - Statistics overview
//!
//! # Lessons
//! GET  /lessons                       - Lesson table (search, filters, sort, pages)
//! POST /lessons/bulk                  - Publish/archive/delete the selection
//! POST /lessons/import                - Import a JSON file
//! POST /lessons/demo                  - Add the demo C lesson
//! POST /lessons/{id}/toggle           - Published <-> draft
//! POST /lessons/{id}/delete           - Delete one lesson
//! POST /lessons/{id}/edit             - Open in the editor
//! POST /lessons/{id}/duplicate        - Copy into the editor
//! GET  /lessons/editor                - Editor page
//! POST /lessons/editor                - Save, publish or format the draft
//! POST /lessons/editor/new            - Start a new lesson
//! POST /lessons/editor/category       - Quick-add a category
//! GET  /lessons/editor/preview        - Rendered draft (new tab)
//!
//! # Editor API (JSON, used by the editor script)
//! PUT  /api/editor/draft              - Replace the draft fields
//! POST /api/editor/format             - Apply a toolbar action
//! GET  /api/editor/status             - Saving / last saved / last autosave
//!
//! # Categories
//! GET  /categories                    - Category list
//! POST /categories                    - Create
//! POST /categories/{id}               - Update
//! POST /categories/{id}/delete        - Delete
//!
//! # Media
//! GET  /media                         - Media library
//! POST /media                         - Upload (multipart)
//! POST /media/{id}/delete             - Delete
//! ```

use askama::Template;
use axum::{
    Router,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};

use crate::middleware::{AdminContext, set_flash};
use crate::models::Flash;
use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod editor;
pub mod lessons;
pub mod media;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .merge(auth::router())
        .merge(lessons::router())
        .merge(editor::router())
        .merge(categories::router())
        .merge(media::router())
}

/// Signed-in admin shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
}

impl From<&AdminContext> for AdminUserView {
    fn from(admin: &AdminContext) -> Self {
        Self {
            name: admin.display_name.clone(),
        }
    }
}

/// Render a template into a response, logging failures.
pub fn render(template: &impl Template) -> Response {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
    .into_response()
}

/// Redirect after queueing a flash message.
pub async fn redirect_with(admin: &AdminContext, to: &str, flash: Flash) -> Response {
    if let Err(err) = set_flash(&admin.session, flash).await {
        tracing::warn!(error = %err, "Failed to store flash message");
    }
    Redirect::to(to).into_response()
}
