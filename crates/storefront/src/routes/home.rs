//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::Utc;
use proglearn_core::editor::listing::popular_lessons;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::views::{CategoryView, LessonCard};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub popular: Vec<LessonCard>,
    pub categories: Vec<CategoryView>,
    pub total_lessons: usize,
    pub total_views: u64,
}

/// Display the home page.
///
/// Published lessons and categories are fetched concurrently.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let backend = state.backend();
    let (lessons, categories) =
        tokio::try_join!(backend.list_published_lessons(), backend.list_categories())?;

    let now = Utc::now();
    Ok(HomeTemplate {
        popular: LessonCard::many(popular_lessons(&lessons), now),
        categories: categories.iter().map(CategoryView::from).collect(),
        total_lessons: lessons.len(),
        total_views: lessons.iter().map(|l| l.views_count).sum(),
    })
}
