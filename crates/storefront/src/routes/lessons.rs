//! Lesson list and lesson page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use proglearn_core::LessonId;
use proglearn_core::editor::listing::{category_names, public_filter, related_lessons};
use proglearn_core::render::{render_markdown, render_snippets};
use proglearn_core::text::{META_DESCRIPTION_MAX_CHARS, excerpt_from_content, take_chars};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;
use crate::views::LessonCard;

/// Lesson list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive title search.
    #[serde(default)]
    pub q: String,
    /// Category name; empty means all.
    #[serde(default)]
    pub category: String,
}

impl ListQuery {
    fn category(&self) -> Option<&str> {
        Some(self.category.trim()).filter(|c| !c.is_empty())
    }
}

/// Lesson list template.
#[derive(Template, WebTemplate)]
#[template(path = "lessons/index.html")]
pub struct LessonsIndexTemplate {
    pub lessons: Vec<LessonCard>,
    pub categories: Vec<String>,
    pub search: String,
    pub selected_category: String,
    pub heading: String,
}

/// A rendered code snippet.
pub struct SnippetView {
    pub title: String,
    pub html: String,
}

/// Lesson page template.
#[derive(Template, WebTemplate)]
#[template(path = "lessons/show.html")]
pub struct LessonShowTemplate {
    pub lesson: LessonCard,
    pub meta_description: String,
    pub body_html: String,
    pub snippets: Vec<SnippetView>,
    pub related: Vec<LessonCard>,
    pub published_on: String,
}

/// Display the published lesson list, filtered by title and category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<LessonsIndexTemplate> {
    let lessons = state.backend().list_published_lessons().await?;
    let matches = public_filter(&lessons, &query.q, query.category());

    Ok(LessonsIndexTemplate {
        lessons: LessonCard::many(matches, Utc::now()),
        categories: category_names(&lessons),
        heading: query
            .category()
            .map_or_else(|| "All lessons".to_string(), |c| format!("{c} lessons")),
        search: query.q,
        selected_category: query.category,
    })
}

/// Display one lesson and count the view.
///
/// Drafts and archived lessons are not shown here even when the backend
/// returns them.
#[instrument(skip(state), fields(lesson_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<LessonId>,
) -> Result<LessonShowTemplate> {
    let backend = state.backend();
    let (lesson, published) =
        tokio::try_join!(backend.fetch_lesson(id), backend.list_published_lessons())?;

    if !lesson.is_published() {
        return Err(AppError::NotFound(format!("lesson {id}")));
    }

    match backend.increment_lesson_views(id).await {
        Ok(()) => {}
        Err(err) if err.is_permission_denied() => {
            debug!("View not counted: anonymous updates are not allowed");
        }
        Err(err) => warn!(error = %err, "Failed to count lesson view"),
    }
    add_breadcrumb("navigation", &format!("Viewed lesson {id}"));

    let now = Utc::now();
    let excerpt = lesson
        .excerpt
        .clone()
        .unwrap_or_else(|| excerpt_from_content(&lesson.content));
    let meta_description = lesson
        .meta_description
        .clone()
        .unwrap_or_else(|| take_chars(&excerpt, META_DESCRIPTION_MAX_CHARS));

    Ok(LessonShowTemplate {
        meta_description,
        body_html: render_markdown(&lesson.content),
        snippets: render_snippets(&lesson.code_snippets)
            .into_iter()
            .map(|(title, html)| SnippetView { title, html })
            .collect(),
        related: LessonCard::many(related_lessons(&lesson, &published), now),
        published_on: lesson.created_at.format("%B %-d, %Y").to_string(),
        lesson: LessonCard::new(&lesson, now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_category_means_all() {
        let query = ListQuery {
            q: String::new(),
            category: "  ".to_string(),
        };
        assert_eq!(query.category(), None);

        let query = ListQuery {
            q: String::new(),
            category: "Python".to_string(),
        };
        assert_eq!(query.category(), Some("Python"));
    }
}
