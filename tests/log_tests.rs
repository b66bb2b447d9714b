mod test_utils;

use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

use portfolio_admin::entities::log_entry::{LogCategory, LogLevel};

async fn record(app: &TestApp, token: &str, level: &str, category: &str, message: &str) {
    let response = app
        .post_json(
            "/api/admin/logs",
            token,
            &json!({ "level": level, "category": category, "message": message }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[actix_rt::test]
async fn unknown_level_or_category_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app.get("/api/admin/logs?level=verbose", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "level");

    let response = app.get("/api/admin/logs?category=billing", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["field"], "category");
}

#[actix_rt::test]
async fn filters_return_exactly_the_matching_entries() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    record(&app, &token, "error", "project", "Upload failed").await;
    record(&app, &token, "error", "client", "Render crashed").await;
    record(&app, &token, "info", "project", "Opened editor").await;
    app.flush_logs().await;

    let body: Value = app
        .get("/api/admin/logs?level=error&category=project", &token)
        .await
        .json()
        .await
        .unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(items[0]["message"], "Upload failed");
    assert_eq!(items[0]["user"], ADMIN_USERNAME);

    let body: Value = app.get("/api/admin/logs?level=ERROR&category=all", &token).await.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|entry| entry["level"] == "error"));
}

#[actix_rt::test]
async fn client_log_validation() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .post_json("/api/admin/logs", &token, &json!({ "level": "loud", "message": "x" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json("/api/admin/logs", &token, &json!({ "level": "info", "message": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json("/api/admin/logs", &token, &json!({ "level": "warn", "message": "Slow render" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    app.flush_logs().await;
    let stored = app
        .logs
        .all()
        .into_iter()
        .find(|e| e.message == "Slow render")
        .unwrap();
    assert_eq!(stored.category, LogCategory::Client);
    assert_eq!(stored.level, LogLevel::Warn);
}

#[actix_rt::test]
async fn failed_admin_requests_are_logged() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let missing = bson::oid::ObjectId::new().to_hex();
    let response = app.get(&format!("/api/admin/projects/{missing}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.flush_logs().await;
    let entry = app
        .logs
        .all()
        .into_iter()
        .find(|e| e.category == LogCategory::Request)
        .expect("404 should produce a request log entry");
    assert_eq!(entry.level, LogLevel::Warn);
    assert_eq!(entry.user.as_deref(), Some(ADMIN_USERNAME));
    let request = entry.request.unwrap();
    assert_eq!(request.status, Some(404));
    assert_eq!(request.method, "GET");
}

#[actix_rt::test]
async fn purge_removes_entries_before_the_cutoff() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    record(&app, &token, "info", "system", "Old news").await;

    let response = app.delete("/api/admin/logs?before=not-a-date", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let tomorrow = (chrono::Utc::now() + chrono::Duration::days(1)).format("%Y-%m-%d");
    let response = app.delete(&format!("/api/admin/logs?before={tomorrow}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["deletedCount"].as_u64().unwrap() >= 1);

    assert!(app.logs.all().iter().all(|e| e.message != "Old news"));
}
