//! Lesson table operations.

use chrono::{DateTime, Utc};
use proglearn_core::{Lesson, LessonId, LessonPatch, LessonPayload};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::client::BackendClient;
use crate::error::BackendError;

const TABLE: &str = "lessons";

/// Columns for public listings.
const PUBLISHED_COLUMNS: &str = "id,title,content,featured_image,status,category_id,views_count,created_at,updated_at,excerpt,meta_description,categories(name,difficulty)";

/// Columns for a single lesson page.
const DETAIL_COLUMNS: &str = "*,categories(name,difficulty)";

/// Columns for the admin lesson table.
const ADMIN_COLUMNS: &str = "id,title,content,code_snippets,featured_image,category_id,status,views_count,created_at,updated_at,excerpt,meta_description,categories(name,difficulty)";

const VIEW_COUNTER_RPC: &str = "increment_lesson_views";

/// An update body stamped with the time of the change.
#[derive(Serialize)]
struct Stamped<'a> {
    #[serde(flatten)]
    patch: &'a LessonPatch,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct IncrementViews {
    lesson_id: LessonId,
}

impl BackendClient {
    /// Published lessons with their category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_published_lessons(&self) -> Result<Vec<Lesson>, BackendError> {
        let url = self.table_url(
            TABLE,
            &[
                ("select", PUBLISHED_COLUMNS),
                ("status", "eq.published"),
                ("order", "created_at.desc"),
            ],
        );
        let lessons: Vec<Lesson> = self.send_json(self.request(Method::GET, url)).await?;
        debug!(count = lessons.len(), "Fetched published lessons");
        Ok(lessons)
    }

    /// A single lesson with its category.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if no lesson has this id.
    #[instrument(skip(self), fields(lesson_id = %id))]
    pub async fn fetch_lesson(&self, id: LessonId) -> Result<Lesson, BackendError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(TABLE, &[("select", DETAIL_COLUMNS), ("id", &filter)]);
        self.send_single(self.request(Method::GET, url)).await
    }

    /// Every lesson regardless of status, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_all_lessons(&self) -> Result<Vec<Lesson>, BackendError> {
        let url = self.table_url(
            TABLE,
            &[
                ("select", ADMIN_COLUMNS),
                ("order", "updated_at.desc.nullslast"),
            ],
        );
        let lessons: Vec<Lesson> = self.send_json(self.request(Method::GET, url)).await?;
        debug!(count = lessons.len(), "Fetched all lessons");
        Ok(lessons)
    }

    /// Insert a lesson and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the caller may not write lessons.
    #[instrument(skip(self, payload), fields(title = %payload.title, status = %payload.status))]
    pub async fn create_lesson(&self, payload: &LessonPayload) -> Result<Lesson, BackendError> {
        let url = self.table_url(TABLE, &[("select", "*")]);
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(payload);
        let lesson: Lesson = self.send_single(request).await?;
        debug!(lesson_id = %lesson.id, "Lesson created");
        Ok(lesson)
    }

    /// Apply a partial update, stamping `updated_at`, and return the row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the lesson does not exist (or is not visible to
    /// the caller) and `PermissionDenied` if the update is refused.
    #[instrument(skip(self, patch), fields(lesson_id = %id))]
    pub async fn update_lesson(
        &self,
        id: LessonId,
        patch: &LessonPatch,
    ) -> Result<Lesson, BackendError> {
        let body = Stamped {
            patch,
            updated_at: Utc::now(),
        };
        self.patch_lesson(id, &body).await
    }

    async fn patch_lesson<B: Serialize + Sync>(
        &self,
        id: LessonId,
        body: &B,
    ) -> Result<Lesson, BackendError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(TABLE, &[("id", &filter), ("select", "*")]);
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body);
        self.send_single(request).await
    }

    /// Delete a lesson.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails.
    #[instrument(skip(self), fields(lesson_id = %id))]
    pub async fn delete_lesson(&self, id: LessonId) -> Result<(), BackendError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(TABLE, &[("id", &filter)]);
        self.send_empty(self.request(Method::DELETE, url)).await?;
        debug!("Lesson deleted");
        Ok(())
    }

    /// Count one view of a lesson.
    ///
    /// Uses the `increment_lesson_views` procedure. Deployments without the
    /// procedure fall back to reading the counter and writing it back plus
    /// one, which can lose concurrent increments.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when anonymous writes are not allowed;
    /// callers showing the lesson should ignore that case.
    #[instrument(skip(self), fields(lesson_id = %id))]
    pub async fn increment_lesson_views(&self, id: LessonId) -> Result<(), BackendError> {
        let url = self.endpoint(&["rest", "v1", "rpc", VIEW_COUNTER_RPC]);
        let request = self
            .request(Method::POST, url)
            .json(&IncrementViews { lesson_id: id });

        match self.send_empty(request).await {
            Err(error) if error.is_unknown_function() => {
                warn!("View counter procedure missing, updating the row directly");
                let lesson = self.fetch_lesson(id).await?;
                let patch = LessonPatch::views(lesson.views_count.saturating_add(1));
                self.patch_lesson(id, &patch).await.map(drop)
            }
            other => other,
        }
    }
}
