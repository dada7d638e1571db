//! Category handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use chrono::Utc;
use proglearn_core::CategoryId;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;
use crate::views::{CategoryView, LessonCard};

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryView>,
}

/// Lessons in one category.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub category: CategoryView,
    pub lessons: Vec<LessonCard>,
}

/// Display all categories.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<CategoriesIndexTemplate> {
    let categories = state.backend().list_categories().await?;

    Ok(CategoriesIndexTemplate {
        categories: categories.iter().map(CategoryView::from).collect(),
    })
}

/// Display the published lessons filed under one category.
#[instrument(skip(state), fields(category_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<CategoryShowTemplate> {
    let backend = state.backend();
    let (category, lessons) =
        tokio::try_join!(backend.fetch_category(id), backend.list_published_lessons())?;

    let in_category = lessons.iter().filter(|l| l.category_id == Some(id));

    Ok(CategoryShowTemplate {
        category: CategoryView::from(&category),
        lessons: LessonCard::many(in_category, Utc::now()),
    })
}
