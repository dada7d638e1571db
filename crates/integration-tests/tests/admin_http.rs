//! The admin panel over HTTP, signed in against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use proglearn_core::LessonStatus;
use proglearn_integration_tests::{ADMIN_EMAIL, AdminServer, MockBackend, browser};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_signed_out_visitors_are_sent_to_login() {
    let mock = MockBackend::start().await;
    let admin = AdminServer::start(&mock).await;
    let client = browser();

    let page = client.get(admin.at("/lessons")).send().await.unwrap();
    assert_eq!(page.url().path(), "/auth/login");

    let api = client.get(admin.at("/api/editor/status")).send().await.unwrap();
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_lands_on_the_dashboard() {
    let mock = MockBackend::start().await;
    mock.seed_lesson("Hello, C", LessonStatus::Published, 1500);
    let admin = AdminServer::start(&mock).await;
    let client = admin.signed_in_client().await;

    let dashboard = client.get(admin.at("/")).send().await.unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);
    let html = dashboard.text().await.unwrap();
    assert!(html.contains("Dashboard"));
    assert!(html.contains("Hello, C"));
    assert!(html.contains("1,500"));
    assert!(html.contains("Ada Lovelace"));
}

#[tokio::test]
async fn test_wrong_password_shows_the_backend_message() {
    let mock = MockBackend::start().await;
    let admin = AdminServer::start(&mock).await;

    let response = browser()
        .post(admin.at("/auth/login"))
        .form(&[("email", ADMIN_EMAIL), ("password", "hunter2")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let html = response.text().await.unwrap();
    assert!(html.contains("Invalid login credentials"));
    assert!(html.contains(ADMIN_EMAIL));
}

#[tokio::test]
async fn test_members_without_the_admin_role_are_refused() {
    let mock = MockBackend::start().await;
    mock.member_only(true);
    let admin = AdminServer::start(&mock).await;
    let client = browser();

    let response = client
        .post(admin.at("/auth/login"))
        .form(&[("email", ADMIN_EMAIL), ("password", proglearn_integration_tests::ADMIN_PASSWORD)])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains("does not have admin access"));

    let page = client.get(admin.at("/")).send().await.unwrap();
    assert_eq!(page.url().path(), "/auth/login");
    assert!(
        mock.requests().iter().any(|r| r.path == "/auth/v1/logout"),
        "the member session is revoked"
    );
}

#[tokio::test]
async fn test_editor_draft_is_saved_over_http() {
    let mock = MockBackend::start().await;
    let admin = AdminServer::start(&mock).await;
    let client = admin.signed_in_client().await;

    let status: Value = client
        .put(admin.at("/api/editor/draft"))
        .json(&json!({
            "title": "Strings in C",
            "content": "char *s = \"hi\";",
            "featured_image": "",
            "category_id": null,
            "status": "draft",
            "excerpt": "",
            "meta_description": "",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["unsaved"], true);
    assert_eq!(status["editing_id"], Value::Null);

    let page = client
        .post(admin.at("/lessons/editor"))
        .form(&[
            ("title", "Strings in C"),
            ("content", "char *s = \"hi\";"),
            ("status", "draft"),
            ("intent", "publish"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(page.url().path(), "/lessons/editor");
    assert!(page.text().await.unwrap().contains("Lesson published."));

    let writes = mock.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, Method::POST);
    assert_eq!(writes[0].body["title"], "Strings in C");
    assert_eq!(writes[0].body["status"], "published");

    let status: Value = client
        .get(admin.at("/api/editor/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["unsaved"], false);
    assert!(status["editing_id"].is_i64());
}

#[tokio::test]
async fn test_format_api_wraps_the_selection() {
    let mock = MockBackend::start().await;
    let admin = AdminServer::start(&mock).await;
    let client = admin.signed_in_client().await;

    let edit: Value = client
        .post(admin.at("/api/editor/format"))
        .json(&json!({
            "content": "say hello",
            "action": "bold",
            "selection": { "start": 4, "end": 9 },
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(edit["content"], "say **hello**");
    assert_eq!(edit["selection"], json!({ "start": 6, "end": 11 }));
}

#[tokio::test]
async fn test_bulk_publish_only_touches_the_visible_selection() {
    let mock = MockBackend::start().await;
    let first = mock.seed_lesson("Macros", LessonStatus::Draft, 0);
    let second = mock.seed_lesson("Headers", LessonStatus::Draft, 0);
    let admin = AdminServer::start(&mock).await;
    let client = admin.signed_in_client().await;

    let ids = format!("{first},{second},999");
    let page = client
        .post(admin.at("/lessons/bulk"))
        .form(&[("action", "publish"), ("ids", ids.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(page.url().path(), "/lessons");
    assert!(page.text().await.unwrap().contains("Published 2 lessons."));
    let writes = mock.writes();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|w| w.body_keys() == ["status", "updated_at"]));
    assert_eq!(mock.lesson(first).unwrap()["status"], "published");
    assert_eq!(mock.lesson(second).unwrap()["status"], "published");
}

#[tokio::test]
async fn test_deleting_the_open_lesson_over_http_resets_the_editor() {
    let mock = MockBackend::start().await;
    let id = mock.seed_lesson("Makefiles", LessonStatus::Draft, 0);
    let admin = AdminServer::start(&mock).await;
    let client = admin.signed_in_client().await;

    let editor = client
        .post(admin.at(&format!("/lessons/{id}/edit")))
        .send()
        .await
        .unwrap();
    assert!(editor.text().await.unwrap().contains("Makefiles"));

    client
        .post(admin.at(&format!("/lessons/{id}/delete")))
        .form(&[("back", "/lessons")])
        .send()
        .await
        .unwrap();

    let status: Value = client
        .get(admin.at("/api/editor/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["editing_id"], Value::Null);
    assert_eq!(status["notice"], "The lesson you were editing was deleted.");
    assert!(mock.lesson(id).is_none());
}
