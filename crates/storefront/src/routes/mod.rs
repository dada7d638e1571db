//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Home page (popular lessons, categories)
//! GET  /lessons           - Lesson list (?q= title search, ?category= name)
//! GET  /lesson/{id}       - Single lesson (counts a view)
//! GET  /categories        - Category list
//! GET  /categories/{id}   - Lessons in one category
//! GET  /health            - Health check (registered in main)
//! ```

pub mod categories;
pub mod home;
pub mod lessons;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{id}", get(categories::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/lessons", get(lessons::index))
        .route("/lesson/{id}", get(lessons::show))
        .nest("/categories", category_routes())
}
