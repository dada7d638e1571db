//! Lesson table route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Multipart, Path, Query},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use proglearn_core::editor::listing::parse_id_list;
use proglearn_core::editor::{LessonQuery, SortOrder};
use proglearn_core::text::{relative_time, truncate};
use proglearn_core::{Category, CategoryId, Lesson, LessonId, LessonStatus};
use serde::Deserialize;
use tracing::instrument;

use super::{AdminUserView, redirect_with, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::Flash;
use crate::services::{BulkAction, lessons};
use crate::state::AppState;

/// Longest title shown in the table.
const TABLE_TITLE_CHARS: usize = 60;

/// Table filters as they arrive in the query string or a form.
///
/// Empty values mean "all".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    sort: String,
    #[serde(default)]
    page: String,
}

impl ListQuery {
    fn to_query(&self) -> LessonQuery {
        LessonQuery {
            search: self.q.trim().to_string(),
            status: self.status.parse().ok(),
            category: self.category.parse().ok(),
            sort: self.sort.parse().unwrap_or_default(),
            page: self.page.parse().unwrap_or(1),
        }
    }

    /// Query string that reproduces these filters at `page`.
    fn href(&self, page: usize) -> String {
        let mut pairs = Vec::new();
        for (key, value) in [
            ("q", self.q.trim()),
            ("status", self.status.as_str()),
            ("category", self.category.as_str()),
            ("sort", self.sort.as_str()),
        ] {
            if !value.is_empty() {
                pairs.push(format!("{key}={}", urlencoding::encode(value)));
            }
        }
        if page > 1 {
            pairs.push(format!("page={page}"));
        }
        if pairs.is_empty() {
            "/lessons".to_string()
        } else {
            format!("/lessons?{}", pairs.join("&"))
        }
    }
}

/// Lesson row for the table.
#[derive(Debug, Clone)]
pub struct LessonRowView {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub status: LessonStatus,
    pub toggle_label: &'static str,
    pub views: u64,
    pub updated: String,
}

impl LessonRowView {
    fn new(lesson: &Lesson, now: DateTime<Utc>) -> Self {
        Self {
            id: lesson.id.as_i64(),
            title: truncate(&lesson.title, TABLE_TITLE_CHARS),
            category: lesson.category_name().unwrap_or("Uncategorized").to_string(),
            status: lesson.status,
            toggle_label: match lesson.status {
                LessonStatus::Published => "Unpublish",
                LessonStatus::Draft | LessonStatus::Archived => "Publish",
            },
            views: lesson.views_count,
            updated: relative_time(lesson.last_activity(), now),
        }
    }
}

/// Option in a filter dropdown.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Lesson table template.
#[derive(Template)]
#[template(path = "lessons/index.html")]
pub struct LessonsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub rows: Vec<LessonRowView>,
    pub search: String,
    pub status_options: Vec<OptionView>,
    pub category_options: Vec<OptionView>,
    pub sort_options: Vec<OptionView>,
    pub summary: String,
    pub page: usize,
    pub total_pages: usize,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    /// Filters of this view, posted back by the bulk form.
    pub list: ListQuery,
    /// Query string of this view, posted back by row forms.
    pub back: String,
    pub visible_ids: String,
}

fn status_options(selected: Option<LessonStatus>) -> Vec<OptionView> {
    LessonStatus::ALL
        .into_iter()
        .map(|status| OptionView {
            value: status.as_str().to_string(),
            label: status.as_str().to_string(),
            selected: selected == Some(status),
        })
        .collect()
}

fn category_options(categories: &[Category], selected: Option<CategoryId>) -> Vec<OptionView> {
    categories
        .iter()
        .map(|category| OptionView {
            value: category.id.to_string(),
            label: category.name.clone(),
            selected: selected == Some(category.id),
        })
        .collect()
}

fn sort_options(selected: SortOrder) -> Vec<OptionView> {
    SortOrder::ALL
        .into_iter()
        .map(|order| OptionView {
            value: order.as_str().to_string(),
            label: order.label().to_string(),
            selected: order == selected,
        })
        .collect()
}

/// Build the lessons router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lessons", get(index))
        .route("/lessons/bulk", post(bulk))
        .route("/lessons/import", post(import))
        .route("/lessons/demo", post(demo))
        .route("/lessons/{id}/toggle", post(toggle))
        .route("/lessons/{id}/delete", post(delete))
        .route("/lessons/{id}/edit", post(edit))
        .route("/lessons/{id}/duplicate", post(duplicate))
}

/// Where to go back to after a row action.
///
/// Only same-page query strings are honoured.
fn back_to(back: &str) -> String {
    match back.strip_prefix("/lessons") {
        Some(rest) if rest.is_empty() || rest.starts_with('?') => back.to_string(),
        _ => "/lessons".to_string(),
    }
}

/// Lesson table.
///
/// GET /lessons
#[instrument(skip(admin))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(list): Query<ListQuery>,
) -> Result<Response> {
    let (all, categories) = lessons::load(admin.client.as_ref()).await?;
    let query = list.to_query();
    let page = query.page(&all);
    let now = Utc::now();

    let template = LessonsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/lessons".to_string(),
        flash: take_flash(&admin.session).await,
        rows: page.items.iter().map(|l| LessonRowView::new(l, now)).collect(),
        search: query.search.clone(),
        status_options: status_options(query.status),
        category_options: category_options(&categories, query.category),
        sort_options: sort_options(query.sort),
        summary: page.summary(),
        page: page.page,
        total_pages: page.total_pages,
        previous_href: page.has_previous().then(|| list.href(page.page - 1)),
        next_href: page.has_next().then(|| list.href(page.page + 1)),
        back: list.href(page.page),
        list: list.clone(),
        visible_ids: page
            .ids()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    };

    Ok(render(&template))
}

#[derive(Debug, Deserialize)]
pub struct RowForm {
    status: Option<LessonStatus>,
    #[serde(default)]
    back: String,
}

/// Quick status toggle.
///
/// POST /lessons/{id}/toggle
#[instrument(skip(admin, form))]
pub async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<LessonId>,
    Form(form): Form<RowForm>,
) -> Response {
    let current = form.status.unwrap_or_default();
    let to = back_to(&form.back);
    match lessons::toggle_status(admin.client.as_ref(), id, current).await {
        Ok(lesson) => {
            let message = format!("\"{}\" is now {}.", truncate(&lesson.title, 40), lesson.status);
            redirect_with(&admin, &to, Flash::success(message)).await
        }
        Err(err) => redirect_with(&admin, &to, Flash::error(err.message)).await,
    }
}

/// Delete one lesson.
///
/// POST /lessons/{id}/delete
#[instrument(skip(admin, form))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<LessonId>,
    Form(form): Form<RowForm>,
) -> Response {
    let to = back_to(&form.back);
    match lessons::delete(admin.client.as_ref(), Some(admin.editor.as_ref()), id).await {
        Ok(()) => redirect_with(&admin, &to, Flash::success("Lesson deleted.")).await,
        Err(err) => redirect_with(&admin, &to, Flash::error(err.message)).await,
    }
}

/// Open a lesson in the editor.
///
/// POST /lessons/{id}/edit
#[instrument(skip(admin))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<LessonId>,
) -> Result<Response> {
    let lesson = admin.client.fetch_lesson(id).await?;
    admin.editor.edit(&lesson);
    Ok(Redirect::to("/lessons/editor").into_response())
}

/// Copy a lesson into a new draft.
///
/// POST /lessons/{id}/duplicate
#[instrument(skip(admin))]
pub async fn duplicate(
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<LessonId>,
) -> Result<Response> {
    let lesson = admin.client.fetch_lesson(id).await?;
    admin.editor.duplicate(&lesson);
    admin.editor.set_notice("Copy created. Save to keep it.");
    Ok(Redirect::to("/lessons/editor").into_response())
}

#[derive(Debug, Deserialize)]
pub struct BulkForm {
    action: BulkAction,
    #[serde(default)]
    ids: String,
    #[serde(default)]
    q: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    sort: String,
    #[serde(default)]
    page: String,
}

impl BulkForm {
    fn list(&self) -> ListQuery {
        ListQuery {
            q: self.q.clone(),
            status: self.status.clone(),
            category: self.category.clone(),
            sort: self.sort.clone(),
            page: self.page.clone(),
        }
    }
}

/// Apply an action to the selected lessons on the current page.
///
/// POST /lessons/bulk
#[instrument(skip(admin, form), fields(action = ?form.action))]
pub async fn bulk(
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<BulkForm>,
) -> Result<Response> {
    let list = form.list();
    let to = list.href(list.to_query().page);

    // Selection is limited to what the admin can currently see.
    let (all, _) = lessons::load(admin.client.as_ref()).await?;
    let page = list.to_query().page(&all);
    let selection = page.visible_selection(&parse_id_list(&form.ids));
    if selection.is_empty() {
        return Ok(redirect_with(&admin, &to, Flash::error("Select at least one lesson.")).await);
    }

    let (outcome, verb) =
        lessons::bulk(admin.client.as_ref(), Some(admin.editor.as_ref()), form.action, &selection).await;
    let flash = if outcome.failed.is_some() {
        Flash::error(outcome.summary(verb))
    } else {
        Flash::success(outcome.summary(verb))
    };
    Ok(redirect_with(&admin, &to, flash).await)
}

/// Import lessons from an uploaded JSON file.
///
/// POST /lessons/import
#[instrument(skip(admin, multipart))]
pub async fn import(
    RequireAdminAuth(admin): RequireAdminAuth,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            document = Some(
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| AppError::BadRequest("Import file must be UTF-8 JSON".to_string()))?,
            );
        }
    }

    let Some(document) = document else {
        return Ok(redirect_with(&admin, "/lessons", Flash::error("Choose a JSON file to import.")).await);
    };

    let flash = match lessons::import(admin.client.as_ref(), &document).await {
        Ok(outcome) if outcome.failed.is_none() => Flash::success(outcome.summary("Imported")),
        Ok(outcome) => Flash::error(outcome.summary("Imported")),
        Err(err) => Flash::error(err.to_string()),
    };
    Ok(redirect_with(&admin, "/lessons", flash).await)
}

/// Add the demo C lesson.
///
/// POST /lessons/demo
#[instrument(skip(admin))]
pub async fn demo(RequireAdminAuth(admin): RequireAdminAuth) -> Response {
    match lessons::create_demo(admin.client.as_ref()).await {
        Ok(lesson) => {
            let message = format!("Demo lesson \"{}\" created.", lesson.title);
            redirect_with(&admin, "/lessons", Flash::success(message)).await
        }
        Err(err) => redirect_with(&admin, "/lessons", Flash::error(err.message)).await,
    }
}
