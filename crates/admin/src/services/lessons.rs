//! Lesson manager actions that go beyond a single editor save.

use proglearn_backend::{BackendError, LessonGateway};
use proglearn_core::editor::{demo_lesson, parse_import};
use proglearn_core::{
    Category, CategoryPayload, Difficulty, Lesson, LessonId, LessonPatch, LessonStatus,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::editor::{EditorError, EditorSession};

/// An action applied to every selected lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Publish,
    Archive,
    Delete,
}

impl BulkAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Publish => "Published",
            Self::Archive => "Archived",
            Self::Delete => "Deleted",
        }
    }
}

/// Result of a bulk action or import.
///
/// Work stops at the first failure; everything before it stays applied.
#[derive(Debug)]
pub struct BatchOutcome {
    pub applied: usize,
    pub failed: Option<BackendError>,
}

impl BatchOutcome {
    /// Message for the lesson table, e.g. "Published 3 lessons."
    #[must_use]
    pub fn summary(&self, verb: &str) -> String {
        let noun = if self.applied == 1 { "lesson" } else { "lessons" };
        match &self.failed {
            None => format!("{verb} {} {noun}.", self.applied),
            Some(err) => format!("{verb} {} {noun}, then failed: {err}", self.applied),
        }
    }
}

/// Every lesson and category, fetched together.
///
/// # Errors
///
/// Returns the first backend error.
pub async fn load<G>(gateway: &G) -> Result<(Vec<Lesson>, Vec<Category>), BackendError>
where
    G: LessonGateway + ?Sized,
{
    tokio::try_join!(gateway.list_all_lessons(), gateway.list_categories())
}

/// Flip a lesson between published and draft with a status-only update.
///
/// # Errors
///
/// Returns the backend error; the lesson is unchanged.
#[instrument(skip(gateway))]
pub async fn toggle_status<G>(
    gateway: &G,
    id: LessonId,
    current: LessonStatus,
) -> Result<Lesson, BackendError>
where
    G: LessonGateway + ?Sized,
{
    gateway
        .update_lesson(id, &LessonPatch::status(current.toggled()))
        .await
}

/// Delete a lesson, resetting the editor if it had that lesson open.
///
/// # Errors
///
/// Returns the backend error; the editor is untouched.
#[instrument(skip(gateway, editor))]
pub async fn delete<G>(
    gateway: &G,
    editor: Option<&EditorSession<G>>,
    id: LessonId,
) -> Result<(), BackendError>
where
    G: LessonGateway + ?Sized,
{
    gateway.delete_lesson(id).await?;
    if let Some(editor) = editor {
        editor.on_deleted(id);
    }
    info!(lesson_id = %id, "Lesson deleted");
    Ok(())
}

/// Apply `action` to each id in turn.
#[instrument(skip(gateway, editor, ids), fields(count = ids.len()))]
pub async fn bulk<G>(
    gateway: &G,
    editor: Option<&EditorSession<G>>,
    action: BulkAction,
    ids: &[LessonId],
) -> (BatchOutcome, &'static str)
where
    G: LessonGateway + ?Sized,
{
    let mut applied = 0;
    for &id in ids {
        let result = match action {
            BulkAction::Publish => gateway
                .update_lesson(id, &LessonPatch::status(LessonStatus::Published))
                .await
                .map(|_| ()),
            BulkAction::Archive => gateway
                .update_lesson(id, &LessonPatch::status(LessonStatus::Archived))
                .await
                .map(|_| ()),
            BulkAction::Delete => delete(gateway, editor, id).await,
        };
        if let Err(err) = result {
            warn!(lesson_id = %id, error = %err, "Bulk action stopped");
            return (
                BatchOutcome {
                    applied,
                    failed: Some(err),
                },
                action.verb(),
            );
        }
        applied += 1;
    }
    (
        BatchOutcome {
            applied,
            failed: None,
        },
        action.verb(),
    )
}

/// Create one lesson per record in a JSON import document.
///
/// # Errors
///
/// Returns [`EditorError::Import`] when the document cannot be parsed, in
/// which case nothing is created. Backend failures are reported through
/// the outcome.
#[instrument(skip(gateway, document))]
pub async fn import<G>(gateway: &G, document: &str) -> Result<BatchOutcome, EditorError>
where
    G: LessonGateway + ?Sized,
{
    let payloads = parse_import(document)?;
    let mut applied = 0;
    for payload in &payloads {
        if let Err(err) = gateway.create_lesson(payload).await {
            warn!(title = %payload.title, error = %err, "Import stopped");
            return Ok(BatchOutcome {
                applied,
                failed: Some(err),
            });
        }
        applied += 1;
    }
    info!(count = applied, "Lessons imported");
    Ok(BatchOutcome {
        applied,
        failed: None,
    })
}

/// Create the published demo lesson.
///
/// # Errors
///
/// Returns the backend error.
pub async fn create_demo<G>(gateway: &G) -> Result<Lesson, BackendError>
where
    G: LessonGateway + ?Sized,
{
    gateway.create_lesson(&demo_lesson()).await
}

/// Create a beginner category from the editor and select it in the draft.
///
/// # Errors
///
/// Returns [`EditorError::EmptyCategoryName`] for a blank name, without
/// contacting the backend, or the backend error.
#[instrument(skip(gateway, editor))]
pub async fn quick_category<G>(
    gateway: &G,
    editor: &EditorSession<G>,
    name: &str,
) -> Result<Category, EditorError>
where
    G: LessonGateway + ?Sized,
{
    let payload =
        CategoryPayload::new(name, Difficulty::Beginner).ok_or(EditorError::EmptyCategoryName)?;
    let category = gateway.create_category(&payload).await?;
    editor.select_category(Some(category.id));
    editor.set_notice(format!("Category \"{}\" created.", category.name));
    Ok(category)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::editor::tests::{FakeLessons, lesson};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_toggle_sends_status_only_patch() {
        let gateway = FakeLessons::default();
        let updated = toggle_status(&gateway, LessonId::new(3), LessonStatus::Published)
            .await
            .unwrap();

        assert_eq!(updated.status, LessonStatus::Draft);
        let patches = gateway.patches.lock().unwrap().clone();
        assert_eq!(patches, vec![LessonPatch::status(LessonStatus::Draft)]);
    }

    #[tokio::test]
    async fn test_import_creates_one_lesson_per_record() {
        let gateway = FakeLessons::default();
        let outcome = import(
            &gateway,
            r#"[{"title": "One", "content": "a"}, {"title": "Two"}, {}]"#,
        )
        .await
        .unwrap();

        assert_eq!(outcome.applied, 3);
        assert!(outcome.failed.is_none());
        assert_eq!(
            gateway.writes(),
            vec!["create:One", "create:Two", "create:Imported Lesson"]
        );
    }

    #[tokio::test]
    async fn test_invalid_import_creates_nothing() {
        let gateway = FakeLessons::default();
        let err = import(&gateway, "not json").await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid file format"));
        assert!(gateway.writes().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_stops_at_first_failure() {
        let gateway = FakeLessons::default();
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let ids = [LessonId::new(1), LessonId::new(2)];

        let (outcome, verb) = bulk(&gateway, None, BulkAction::Archive, &ids).await;
        assert_eq!(outcome.applied, 0);
        assert!(outcome.failed.is_some());
        assert_eq!(gateway.writes().len(), 1);
        assert!(outcome.summary(verb).starts_with("Archived 0 lessons, then failed"));
    }

    #[tokio::test]
    async fn test_bulk_delete_resets_editor() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(Arc::clone(&gateway));
        editor.edit(&lesson(2, "Open", LessonStatus::Draft));

        let ids = [LessonId::new(1), LessonId::new(2)];
        let (outcome, verb) = bulk(gateway.as_ref(), Some(&editor), BulkAction::Delete, &ids).await;

        assert_eq!(outcome.summary(verb), "Deleted 2 lessons.");
        assert_eq!(editor.editing_id(), None);
    }

    #[tokio::test]
    async fn test_quick_category_selects_new_category() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(Arc::clone(&gateway));

        let category = quick_category(gateway.as_ref(), &editor, "  Rust ").await.unwrap();
        assert_eq!(category.name, "Rust");
        assert_eq!(category.difficulty, Difficulty::Beginner);
        assert_eq!(editor.draft().category_id, Some(category.id));

        let blank = quick_category(gateway.as_ref(), &editor, "   ").await;
        assert!(matches!(blank, Err(EditorError::EmptyCategoryName)));
    }

    #[tokio::test]
    async fn test_demo_lesson_is_published() {
        let gateway = FakeLessons::default();
        let demo = create_demo(&gateway).await.unwrap();
        assert_eq!(demo.status, LessonStatus::Published);
    }
}
