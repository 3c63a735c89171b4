//! HTTP-level integration tests for the `/pages` endpoints.
//!
//! Requests go through the production router over the in-memory store.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, delete_auth, get, get_auth, post_json_auth,
    put_json_auth, token_for, ADMIN_USER_ID,
};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_blocks(text: &str) -> Value {
    json!([
        { "id": "h1", "type": "heading", "props": { "headingText": text, "level": 1 }, "order": 0 }
    ])
}

async fn create_page(app: axum::Router, slug: &str) -> Value {
    let body = json!({ "slug": slug, "title": "About us" });
    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_page_starts_as_draft() {
    let (app, _store) = build_test_app();
    let body = json!({
        "slug": "  About-Us ",
        "title": "About us",
        "blocks": heading_blocks("Welcome"),
        "metaKeywords": ["company", "team"]
    });

    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let page = &body_json(response).await["data"];
    assert_eq!(page["slug"], "about-us");
    assert_eq!(page["status"], "draft");
    assert_eq!(page["currentVersion"], 0);
    assert_eq!(page["publishedAt"], Value::Null);
    assert_eq!(page["authorId"], ADMIN_USER_ID);
    assert_eq!(page["blocks"][0]["props"]["headingText"], "Welcome");
    assert_eq!(page["metaKeywords"], json!(["company", "team"]));
    assert_eq!(page["readingTimeMinutes"], 1);
}

#[tokio::test]
async fn test_create_page_rejects_invalid_slug() {
    let (app, _store) = build_test_app();
    let body = json!({ "slug": "about us!", "title": "About us" });

    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("slug"));
}

#[tokio::test]
async fn test_create_page_rejects_short_title() {
    let (app, _store) = build_test_app();
    let body = json!({ "slug": "about", "title": "ab" });

    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_page_rejects_unknown_block_type() {
    let (app, _store) = build_test_app();
    let body = json!({
        "slug": "about",
        "title": "About us",
        "blocks": [{ "id": "x", "type": "marquee", "props": {}, "order": 0 }]
    });

    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_page_duplicate_slug_conflicts() {
    let (app, _store) = build_test_app();
    create_page(app.clone(), "taken").await;

    let body = json!({ "slug": "taken", "title": "Another page" });
    let response = post_json_auth(app, "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Read / update / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_missing_page_returns_404() {
    let (app, _store) = build_test_app();
    let response = get_auth(app, "/api/v1/pages/999", &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Page with id 999 not found");
}

#[tokio::test]
async fn test_update_with_blocks_autosaves_version() {
    let (app, _store) = build_test_app();
    let page = create_page(app.clone(), "autosave").await;
    let id = page["id"].as_i64().unwrap();

    let body = json!({ "blocks": heading_blocks("Draft one") });
    let response = put_json_auth(app.clone(), &format!("/api/v1/pages/{id}"), body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = &body_json(response).await["data"];
    assert_eq!(updated["currentVersion"], 1);
    assert_eq!(updated["blocks"][0]["props"]["headingText"], "Draft one");

    let response = get_auth(
        app,
        &format!("/api/v1/versions/history/{id}"),
        &admin_token(),
    )
    .await;
    let history = body_json(response).await;
    assert_eq!(history["count"], 1);
    assert_eq!(history["data"][0]["saveType"], "auto");
    assert_eq!(history["data"][0]["savedBy"], ADMIN_USER_ID);
}

#[tokio::test]
async fn test_block_order_is_rewritten_to_array_position() {
    let (app, _store) = build_test_app();
    let blocks = json!([
        { "id": "b", "type": "divider", "order": 7 },
        { "id": "a", "type": "heading", "props": { "headingText": "Top", "level": 2 }, "order": 7 },
        { "id": "c", "type": "spacer", "order": 0 }
    ]);
    let body = json!({ "slug": "shuffled", "title": "Shuffled", "blocks": blocks });
    let response = post_json_auth(app.clone(), "/api/v1/pages", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = &body_json(response).await["data"];
    let ids: Vec<_> = created["blocks"].as_array().unwrap().iter().map(|b| b["id"].clone()).collect();
    let orders: Vec<_> = created["blocks"].as_array().unwrap().iter().map(|b| b["order"].clone()).collect();
    assert_eq!(ids, vec![json!("b"), json!("a"), json!("c")]);
    assert_eq!(orders, vec![json!(0), json!(1), json!(2)]);

    let id = created["id"].as_i64().unwrap();
    let body = json!({ "blocks": [
        { "id": "c", "type": "spacer", "order": 5 },
        { "id": "b", "type": "divider", "order": 2 }
    ] });
    let response = put_json_auth(app, &format!("/api/v1/pages/{id}"), body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = &body_json(response).await["data"];
    assert_eq!(updated["blocks"][0]["order"], 0);
    assert_eq!(updated["blocks"][1]["order"], 1);
}

#[tokio::test]
async fn test_update_without_blocks_skips_autosave() {
    let (app, _store) = build_test_app();
    let page = create_page(app.clone(), "meta-only").await;
    let id = page["id"].as_i64().unwrap();

    let body = json!({ "title": "New title", "metaTitle": "Short meta" });
    let response = put_json_auth(app.clone(), &format!("/api/v1/pages/{id}"), body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = &body_json(response).await["data"];
    assert_eq!(updated["title"], "New title");
    assert_eq!(updated["metaTitle"], "Short meta");
    assert_eq!(updated["currentVersion"], 0);

    let response = get_auth(
        app,
        &format!("/api/v1/versions/history/{id}"),
        &admin_token(),
    )
    .await;
    assert_eq!(body_json(response).await["count"], 0);
}

#[tokio::test]
async fn test_update_rejects_long_meta_description() {
    let (app, _store) = build_test_app();
    let page = create_page(app.clone(), "long-meta").await;
    let id = page["id"].as_i64().unwrap();

    let body = json!({ "metaDescription": "x".repeat(161) });
    let response = put_json_auth(app, &format!("/api/v1/pages/{id}"), body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_page_returns_404() {
    let (app, _store) = build_test_app();
    let body = json!({ "blocks": heading_blocks("Nobody home") });

    let response = put_json_auth(app, "/api/v1/pages/12345", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_page_removes_versions() {
    let (app, _store) = build_test_app();
    let page = create_page(app.clone(), "doomed").await;
    let id = page["id"].as_i64().unwrap();

    let body = json!({ "blocks": heading_blocks("v1") });
    put_json_auth(app.clone(), &format!("/api/v1/pages/{id}"), body, &admin_token()).await;
    let history = body_json(
        get_auth(app.clone(), &format!("/api/v1/versions/history/{id}"), &admin_token()).await,
    )
    .await;
    let version_id = history["data"][0]["id"].as_i64().unwrap();

    let response = delete_auth(app.clone(), &format!("/api/v1/pages/{id}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.clone(), &format!("/api/v1/pages/{id}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app, &format!("/api/v1/versions/{version_id}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_page_returns_404() {
    let (app, _store) = build_test_app();
    let response = delete_auth(app, "/api/v1/pages/77", &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pages_require_authentication() {
    let (app, _store) = build_test_app();
    let response = get(app, "/api/v1/pages/1").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_pages_require_admin_role() {
    let (app, _store) = build_test_app();
    let token = token_for(3, "editor");
    let body = json!({ "slug": "sneaky", "title": "Sneaky page" });

    let response = post_json_auth(app, "/api/v1/pages", body, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (app, _store) = build_test_app();
    let response = get_auth(app, "/api/v1/pages/1", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
