//! HTTP-level integration tests for publish, unpublish and schedule, plus
//! the scheduled-publish sweep observed through the API.

mod common;

use axum::http::StatusCode;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use common::{
    admin_token, body_json, build_test_app, get_auth, post_json_auth, put_auth, put_json_auth,
};
use pagecraft_api::background::scheduled_publish::ScheduledPublisher;
use pagecraft_api::config::SchedulerConfig;
use pagecraft_api::engine::publishing::publish_due_pages;
use serde_json::{json, Value};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_page(app: Router, slug: &str) -> i64 {
    let body = json!({ "slug": slug, "title": "Launch post" });
    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn transition(app: Router, page_id: i64, action: &str) -> (StatusCode, Value) {
    let response = put_auth(
        app,
        &format!("/api/v1/pages/{page_id}/{action}"),
        &admin_token(),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn schedule(app: Router, page_id: i64, at: Value) -> (StatusCode, Value) {
    let response = put_json_auth(
        app,
        &format!("/api/v1/pages/{page_id}/schedule"),
        json!({ "scheduledAt": at }),
        &admin_token(),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn fetch(app: Router, page_id: i64) -> Value {
    let response = get_auth(app, &format!("/api/v1/pages/{page_id}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

// ---------------------------------------------------------------------------
// Manual transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_publish_sets_status_and_date() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "publish-now").await;

    let (status, json) = transition(app, id, "publish").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "published");
    assert!(json["data"]["publishedAt"].is_string());
    assert_eq!(json["data"]["scheduledAt"], Value::Null);
}

#[tokio::test]
async fn test_republish_keeps_original_date() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "republish").await;

    let (_, first) = transition(app.clone(), id, "publish").await;
    let (_, second) = transition(app, id, "publish").await;
    assert_eq!(first["data"]["publishedAt"], second["data"]["publishedAt"]);
}

#[tokio::test]
async fn test_unpublish_returns_to_draft() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "take-down").await;
    transition(app.clone(), id, "publish").await;

    let (status, json) = transition(app, id, "unpublish").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "draft");
    assert_eq!(json["data"]["publishedAt"], Value::Null);
}

#[tokio::test]
async fn test_publish_missing_page_returns_404() {
    let (app, _store) = build_test_app();
    let (status, json) = transition(app, 8080, "publish").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_publishing_does_not_create_versions() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "no-snapshot").await;
    transition(app.clone(), id, "publish").await;

    let response = get_auth(
        app,
        &format!("/api/v1/versions/history/{id}"),
        &admin_token(),
    )
    .await;
    assert_eq!(body_json(response).await["count"], 0);
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_schedule_in_future_arms_draft() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "later").await;
    transition(app.clone(), id, "publish").await;
    let at = Utc::now() + Duration::hours(2);

    let (status, json) = schedule(app, id, json!(at.to_rfc3339())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "draft");
    assert_eq!(json["data"]["publishedAt"], Value::Null);
    assert_eq!(timestamp(&json["data"]["scheduledAt"]), at);
}

#[tokio::test]
async fn test_schedule_in_past_is_rejected() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "too-late").await;
    let at = Utc::now() - Duration::minutes(5);

    let (status, json) = schedule(app.clone(), id, json!(at.to_rfc3339())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    assert_eq!(fetch(app, id).await["scheduledAt"], Value::Null);
}

#[tokio::test]
async fn test_schedule_requires_date() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "no-date").await;

    let (status, json) = schedule(app.clone(), id, Value::Null).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "scheduledAt is required");

    let (status, _) = schedule(app, id, json!("next tuesday")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unpublish_keeps_pending_schedule() {
    let (app, _store) = build_test_app();
    let id = create_page(app.clone(), "still-armed").await;
    let at = Utc::now() + Duration::days(1);
    schedule(app.clone(), id, json!(at.to_rfc3339())).await;

    let (_, json) = transition(app, id, "unpublish").await;
    assert_eq!(timestamp(&json["data"]["scheduledAt"]), at);
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sweep_publishes_due_page() {
    let (app, store) = build_test_app();
    let id = create_page(app.clone(), "go-live").await;
    let at = Utc::now() + Duration::seconds(30);
    schedule(app.clone(), id, json!(at.to_rfc3339())).await;

    let report = publish_due_pages(&store, at + Duration::seconds(1), 20)
        .await
        .unwrap();
    assert_eq!(report.published, 1);

    let page = fetch(app, id).await;
    assert_eq!(page["status"], "published");
    assert_eq!(page["scheduledAt"], Value::Null);
    assert!(timestamp(&page["publishedAt"]) > at);
}

#[tokio::test]
async fn test_sweep_skips_page_published_manually() {
    let (app, store) = build_test_app();
    let id = create_page(app.clone(), "beat-the-clock").await;
    let at = Utc::now() + Duration::seconds(30);
    schedule(app.clone(), id, json!(at.to_rfc3339())).await;
    let (_, manual) = transition(app.clone(), id, "publish").await;

    let report = publish_due_pages(&store, at + Duration::seconds(1), 20)
        .await
        .unwrap();
    assert_eq!(report.published, 0);

    let page = fetch(app, id).await;
    assert_eq!(page["publishedAt"], manual["data"]["publishedAt"]);
}

#[tokio::test]
async fn test_scheduled_publisher_sweep_leaves_future_pages() {
    let (app, store) = build_test_app();
    let id = create_page(app.clone(), "not-yet").await;
    schedule(
        app.clone(),
        id,
        json!((Utc::now() + Duration::hours(1)).to_rfc3339()),
    )
    .await;

    let publisher = ScheduledPublisher::new(Arc::new(store), SchedulerConfig::default());
    let report = publisher.sweep().await.unwrap();
    assert_eq!(report.published, 0);

    assert_eq!(fetch(app, id).await["status"], "draft");
}
