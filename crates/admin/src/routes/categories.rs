//! Category management route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::Path,
    response::Response,
    routing::{get, post},
};
use proglearn_core::{Category, CategoryId, CategoryPayload, Difficulty};
use serde::Deserialize;
use tracing::instrument;

use super::{AdminUserView, redirect_with, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, take_flash};
use crate::models::Flash;
use crate::state::AppState;

const LIST_PATH: &str = "/categories";

/// Category row.
#[derive(Debug, Clone)]
pub struct CategoryRowView {
    pub id: i64,
    pub name: String,
    pub difficulty: &'static str,
    pub lesson_count: u64,
}

impl From<&Category> for CategoryRowView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.as_i64(),
            name: category.name.clone(),
            difficulty: category.difficulty.as_str(),
            lesson_count: category.lesson_count,
        }
    }
}

/// Category list template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub categories: Vec<CategoryRowView>,
    pub difficulties: Vec<(&'static str, &'static str)>,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(index).post(create))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/delete", post(delete))
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    difficulty: String,
}

impl CategoryForm {
    fn payload(&self) -> Option<CategoryPayload> {
        CategoryPayload::new(&self.name, self.difficulty.parse().unwrap_or_default())
    }
}

/// Category list with create and edit forms.
///
/// GET /categories
#[instrument(skip(admin))]
pub async fn index(RequireAdminAuth(admin): RequireAdminAuth) -> Result<Response> {
    let categories = admin.client.list_categories().await?;

    let template = CategoriesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH.to_string(),
        flash: take_flash(&admin.session).await,
        categories: categories.iter().map(CategoryRowView::from).collect(),
        difficulties: Difficulty::ALL
            .into_iter()
            .map(|d| (d.as_str(), d.label()))
            .collect(),
    };

    Ok(render(&template))
}

/// Create a category.
///
/// POST /categories
#[instrument(skip(admin))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<CategoryForm>,
) -> Response {
    let Some(payload) = form.payload() else {
        return redirect_with(&admin, LIST_PATH, Flash::error("Category name is required.")).await;
    };
    let flash = match admin.client.create_category(&payload).await {
        Ok(category) => Flash::success(format!("Category \"{}\" created.", category.name)),
        Err(err) => Flash::error(err.message),
    };
    redirect_with(&admin, LIST_PATH, flash).await
}

/// Rename a category or change its difficulty.
///
/// POST /categories/{id}
#[instrument(skip(admin))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let Some(payload) = form.payload() else {
        return redirect_with(&admin, LIST_PATH, Flash::error("Category name is required.")).await;
    };
    let flash = match admin.client.update_category(id, &payload).await {
        Ok(category) => Flash::success(format!("Category \"{}\" updated.", category.name)),
        Err(err) => Flash::error(err.message),
    };
    redirect_with(&admin, LIST_PATH, flash).await
}

/// Delete a category.
///
/// POST /categories/{id}/delete
#[instrument(skip(admin))]
pub async fn delete(RequireAdminAuth(admin): RequireAdminAuth, Path(id): Path<CategoryId>) -> Response {
    let flash = match admin.client.delete_category(id).await {
        Ok(()) => {
            // The editor may have had it selected.
            if admin.editor.draft().category_id == Some(id) {
                admin.editor.select_category(None);
            }
            Flash::success("Category deleted.")
        }
        Err(err) => Flash::error(err.message),
    };
    redirect_with(&admin, LIST_PATH, flash).await
}
