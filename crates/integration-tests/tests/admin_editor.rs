//! The lesson editor against the backend client.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use proglearn_admin::services::{EditorSession, lessons};
use proglearn_core::LessonStatus;
use proglearn_core::editor::LessonDraft;
use proglearn_integration_tests::MockBackend;

fn draft(title: &str) -> LessonDraft {
    LessonDraft {
        title: title.to_string(),
        ..LessonDraft::default()
    }
}

#[tokio::test]
async fn test_autosave_never_overlaps_a_save() {
    let mock = MockBackend::start().await;
    mock.set_write_delay(Duration::from_millis(200));
    let editor = Arc::new(EditorSession::new(Arc::new(mock.admin_client())));
    editor.update(draft("Bit manipulation"));

    let saving = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.save().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(editor.is_saving());
    let autosaved = editor.autosave().await.unwrap();

    let saved = saving.await.unwrap().unwrap();
    assert!(autosaved.is_none(), "the save already wrote the draft");
    assert_eq!(mock.max_concurrent_writes(), 1);
    assert_eq!(mock.writes().len(), 1);
    assert_eq!(editor.editing_id(), Some(saved.id));
    assert!(!editor.status().unsaved);
}

#[tokio::test]
async fn test_save_then_publish_updates_the_same_lesson() {
    let mock = MockBackend::start().await;
    let editor = EditorSession::new(Arc::new(mock.admin_client()));
    editor.update(draft("Recursion"));

    let created = editor.save().await.unwrap();
    assert_eq!(created.status, LessonStatus::Draft);

    let published = editor.publish().await.unwrap();
    assert_eq!(published.id, created.id);
    assert_eq!(published.status, LessonStatus::Published);

    let writes = mock.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].method, Method::POST);
    assert_eq!(writes[1].method, Method::PATCH);
    assert_eq!(writes[1].query["id"], format!("eq.{}", created.id));
    assert_eq!(editor.status().notice.as_deref(), Some("Lesson published."));
}

#[tokio::test]
async fn test_blank_title_never_reaches_the_backend() {
    let mock = MockBackend::start().await;
    let editor = EditorSession::new(Arc::new(mock.admin_client()));
    editor.update(draft("   "));

    assert!(editor.save().await.is_err());
    assert!(editor.autosave().await.unwrap().is_none());
    assert!(mock.writes().is_empty());
    assert!(editor.status().error.is_some());
}

#[tokio::test]
async fn test_rejected_save_keeps_the_draft() {
    let mock = MockBackend::start().await;
    mock.deny_writes(true);
    let editor = EditorSession::new(Arc::new(mock.admin_client()));
    editor.update(draft("Heap and stack"));

    assert!(editor.save().await.is_err());

    let status = editor.status();
    assert!(status.unsaved);
    assert_eq!(
        status.error.as_deref(),
        Some("new row violates row-level security policy")
    );
    assert_eq!(editor.draft().title, "Heap and stack");
    assert!(editor.editing_id().is_none());
}

#[tokio::test]
async fn test_deleting_the_open_lesson_resets_the_editor() {
    let mock = MockBackend::start().await;
    let client = mock.admin_client();
    let id = mock.seed_lesson("Linked lists", LessonStatus::Draft, 0);
    let editor = EditorSession::new(Arc::new(client.clone()));
    editor.edit(&client.fetch_lesson(id).await.unwrap());
    assert_eq!(editor.editing_id(), Some(id));

    lessons::delete(&client, Some(&editor), id).await.unwrap();

    assert!(editor.editing_id().is_none());
    assert_eq!(editor.draft(), LessonDraft::default());
    assert_eq!(
        editor.status().notice.as_deref(),
        Some("The lesson you were editing was deleted.")
    );
    assert!(mock.lesson(id).is_none());
}
