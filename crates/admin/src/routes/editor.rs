//! Lesson editor route handlers.
//!
//! The page works as a plain form (save, publish and toolbar buttons all
//! post the whole draft). With the editor script loaded, toolbar actions,
//! draft syncing and the status line go through the JSON API instead.

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use proglearn_core::editor::{Edit, LessonDraft, MarkdownAction, Shortcut, TextSelection};
use proglearn_core::render::render_markdown;
use proglearn_core::text::relative_time;
use proglearn_core::{CategoryId, LessonStatus};
use serde::Deserialize;
use tracing::instrument;

use super::{AdminUserView, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::Flash;
use crate::services::{EditorStatus, lessons};
use crate::state::AppState;

/// Toolbar button.
#[derive(Debug, Clone)]
pub struct ToolbarButton {
    /// Action name posted back, e.g. `bold` or `code-block:c`.
    pub value: String,
    pub label: &'static str,
}

/// Keyboard shortcut row; the editor script binds keys from these.
#[derive(Debug, Clone)]
pub struct ShortcutView {
    pub keys: &'static str,
    pub description: &'static str,
    pub key: &'static str,
    pub modifier: bool,
    pub command: String,
}

impl From<Shortcut> for ShortcutView {
    fn from(shortcut: Shortcut) -> Self {
        Self {
            keys: shortcut.keys_label(),
            description: shortcut.description(),
            key: shortcut.key(),
            modifier: shortcut.needs_modifier(),
            command: shortcut.command(),
        }
    }
}

/// Category choice in the editor.
#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

/// Status choice in the editor.
#[derive(Debug, Clone)]
pub struct StatusChoice {
    pub value: &'static str,
    pub selected: bool,
}

/// Editor page template.
#[derive(Template)]
#[template(path = "lessons/editor.html")]
pub struct EditorTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub draft: LessonDraft,
    pub editing_id: Option<i64>,
    pub categories: Vec<CategoryChoice>,
    pub statuses: Vec<StatusChoice>,
    pub toolbar: Vec<ToolbarButton>,
    pub shortcuts: Vec<ShortcutView>,
    pub status_line: String,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub preview_html: String,
    pub word_count: usize,
    pub reading_minutes: u32,
    pub excerpt: String,
    pub meta_description: String,
    pub autosave_secs: u64,
}

/// Rendered draft opened from the editor.
#[derive(Template)]
#[template(path = "lessons/preview.html")]
pub struct PreviewTemplate {
    pub title: String,
    pub body_html: String,
}

/// "Saving...", "Saved 2 minutes ago", and so on.
fn status_line(status: &EditorStatus, now: DateTime<Utc>) -> String {
    if status.saving {
        return "Saving...".to_string();
    }
    let mut parts = Vec::new();
    if status.unsaved {
        parts.push("Unsaved changes".to_string());
    }
    if let Some(at) = status.last_saved {
        parts.push(format!("Saved {}", relative_time(at, now)));
    }
    if let Some(at) = status.last_autosave {
        parts.push(format!("Autosaved {}", relative_time(at, now)));
    }
    if parts.is_empty() {
        "Not saved yet".to_string()
    } else {
        parts.join(" · ")
    }
}

/// Build the editor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lessons/editor", get(page).post(submit))
        .route("/lessons/editor/new", post(new_lesson))
        .route("/lessons/editor/category", post(quick_category))
        .route("/lessons/editor/preview", get(preview))
        .route("/api/editor/draft", put(update_draft))
        .route("/api/editor/format", post(format_selection))
        .route("/api/editor/status", get(status))
}

/// Editor page.
///
/// GET /lessons/editor
#[instrument(skip(admin, state))]
pub async fn page(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Response> {
    let categories = admin.client.list_categories().await?;
    let draft = admin.editor.draft();
    let status = admin.editor.status();

    let template = EditorTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/lessons".to_string(),
        flash: take_flash(&admin.session).await,
        editing_id: status.editing_id.map(|id| id.as_i64()),
        categories: categories
            .iter()
            .map(|c| CategoryChoice {
                id: c.id.as_i64(),
                name: c.name.clone(),
                selected: draft.category_id == Some(c.id),
            })
            .collect(),
        statuses: LessonStatus::ALL
            .into_iter()
            .map(|s| StatusChoice {
                value: s.as_str(),
                selected: s == draft.status,
            })
            .collect(),
        toolbar: MarkdownAction::toolbar()
            .into_iter()
            .map(|action| ToolbarButton {
                label: action.label(),
                value: action.to_string(),
            })
            .collect(),
        shortcuts: Shortcut::ALL.into_iter().map(ShortcutView::from).collect(),
        status_line: status_line(&status, Utc::now()),
        notice: status.notice.clone(),
        error: status.error.clone(),
        preview_html: render_markdown(&draft.content),
        word_count: draft.word_count(),
        reading_minutes: draft.reading_time_minutes(),
        excerpt: draft.effective_excerpt(),
        meta_description: draft.effective_meta_description(),
        autosave_secs: state.config().autosave_interval.as_secs(),
        draft,
    };

    Ok(render(&template))
}

/// The editor form as posted.
#[derive(Debug, Deserialize)]
pub struct EditorForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    featured_image: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    meta_description: String,
    /// `save`, `publish`, or a toolbar action name.
    #[serde(default)]
    intent: String,
    #[serde(default)]
    selection_start: String,
    #[serde(default)]
    selection_end: String,
}

impl EditorForm {
    fn draft(&self) -> LessonDraft {
        LessonDraft {
            title: self.title.clone(),
            content: self.content.replace("\r\n", "\n"),
            featured_image: self.featured_image.trim().to_string(),
            category_id: self.category.parse::<CategoryId>().ok(),
            status: LessonStatus::parse_lenient(&self.status),
            excerpt: self.excerpt.clone(),
            meta_description: self.meta_description.clone(),
        }
    }

    fn selection(&self) -> TextSelection {
        let end_of_content = self.content.replace("\r\n", "\n").chars().count();
        TextSelection::new(
            self.selection_start.parse().unwrap_or(end_of_content),
            self.selection_end.parse().unwrap_or(end_of_content),
        )
    }
}

/// Save, publish or format the posted draft.
///
/// POST /lessons/editor
#[instrument(skip(admin, form), fields(intent = %form.intent))]
pub async fn submit(
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<EditorForm>,
) -> Response {
    admin.editor.update(form.draft());

    // Failures are kept on the editor and shown on the page.
    match form.intent.as_str() {
        "publish" => {
            let _ = admin.editor.publish().await;
        }
        "save" | "" => {
            let _ = admin.editor.save().await;
        }
        other => match other.parse::<MarkdownAction>() {
            Ok(action) => {
                admin.editor.format(&action, form.selection());
            }
            Err(message) => admin.editor.set_error(message),
        },
    }

    Redirect::to("/lessons/editor").into_response()
}

/// Start a fresh lesson.
///
/// POST /lessons/editor/new
pub async fn new_lesson(RequireAdminAuth(admin): RequireAdminAuth) -> Response {
    admin.editor.reset();
    Redirect::to("/lessons/editor").into_response()
}

#[derive(Debug, Deserialize)]
pub struct QuickCategoryForm {
    #[serde(default)]
    name: String,
}

/// Create a category from the editor and select it.
///
/// POST /lessons/editor/category
#[instrument(skip(admin))]
pub async fn quick_category(
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<QuickCategoryForm>,
) -> Response {
    if let Err(err) =
        lessons::quick_category(admin.client.as_ref(), admin.editor.as_ref(), &form.name).await
    {
        admin.editor.set_error(err.to_string());
    }
    Redirect::to("/lessons/editor").into_response()
}

/// The draft rendered as it would appear on the site.
///
/// GET /lessons/editor/preview
pub async fn preview(RequireAdminAuth(admin): RequireAdminAuth) -> Response {
    let draft = admin.editor.draft();
    render(&PreviewTemplate {
        title: if draft.has_title() {
            draft.title.clone()
        } else {
            "Untitled lesson".to_string()
        },
        body_html: render_markdown(&draft.content),
    })
}

/// Replace the draft with the editor's current fields.
///
/// PUT /api/editor/draft
pub async fn update_draft(
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(draft): Json<LessonDraft>,
) -> Json<EditorStatus> {
    admin.editor.update(draft);
    Json(admin.editor.status())
}

#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    /// Textarea content, which may be ahead of the stored draft.
    content: String,
    action: MarkdownAction,
    selection: TextSelection,
}

/// Apply a toolbar action at the textarea selection.
///
/// POST /api/editor/format
pub async fn format_selection(
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(request): Json<FormatRequest>,
) -> Json<Edit> {
    let mut draft = admin.editor.draft();
    draft.content = request.content;
    admin.editor.update(draft);
    let (content, selection) = admin.editor.format(&request.action, request.selection);
    Json(Edit { content, selection })
}

/// Saving flag and save timestamps for the status line.
///
/// GET /api/editor/status
pub async fn status(RequireAdminAuth(admin): RequireAdminAuth) -> Json<EditorStatus> {
    Json(admin.editor.status())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn idle() -> EditorStatus {
        EditorStatus {
            editing_id: None,
            saving: false,
            unsaved: false,
            last_saved: None,
            last_autosave: None,
            notice: None,
            error: None,
        }
    }

    #[test]
    fn test_shortcut_rows_carry_key_bindings() {
        let rows: Vec<ShortcutView> = Shortcut::ALL.into_iter().map(ShortcutView::from).collect();

        let bold = rows.iter().find(|row| row.key == "b").unwrap();
        assert!(bold.modifier);
        assert_eq!(bold.command, "bold");
        assert_eq!(bold.keys, "Ctrl/Cmd + B");

        let help = rows.iter().find(|row| row.key == "?").unwrap();
        assert!(!help.modifier);
        assert_eq!(help.command, "help");
    }

    #[test]
    fn test_status_line() {
        let now = Utc::now();
        assert_eq!(status_line(&idle(), now), "Not saved yet");

        let saving = EditorStatus {
            saving: true,
            ..idle()
        };
        assert_eq!(status_line(&saving, now), "Saving...");

        let saved = EditorStatus {
            unsaved: true,
            last_saved: Some(now - Duration::minutes(2)),
            ..idle()
        };
        assert_eq!(status_line(&saved, now), "Unsaved changes · Saved 2 minutes ago");
    }

    #[test]
    fn test_form_builds_draft() {
        let form = EditorForm {
            title: "Loops".to_string(),
            content: "a\r\nb".to_string(),
            featured_image: "  https://img.example/a.png ".to_string(),
            category: "4".to_string(),
            status: "bogus".to_string(),
            excerpt: String::new(),
            meta_description: String::new(),
            intent: "bold".to_string(),
            selection_start: "0".to_string(),
            selection_end: String::new(),
        };
        let draft = form.draft();
        assert_eq!(draft.content, "a\nb");
        assert_eq!(draft.featured_image, "https://img.example/a.png");
        assert_eq!(draft.category_id, Some(CategoryId::new(4)));
        assert_eq!(draft.status, LessonStatus::Draft);
        assert_eq!(form.selection(), TextSelection::new(0, 3));
    }
}
