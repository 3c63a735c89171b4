//! Handlers for the `/pages` resource and its publishing transitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pagecraft_core::block::{
    is_order_consistent, normalize_order, parse_blocks, reading_time_minutes, Block,
};
use pagecraft_core::error::CoreError;
use pagecraft_core::publishing::parse_scheduled_at;
use pagecraft_core::types::DbId;
use pagecraft_core::validation::{
    normalize_slug, META_DESCRIPTION_MAX_LEN, META_TITLE_MAX_LEN, SLUG_MAX_LEN, SLUG_MIN_LEN,
    SLUG_PATTERN, TITLE_MAX_LEN, TITLE_MIN_LEN,
};
use pagecraft_db::models::page::{CreatePage, Page, UpdatePage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::engine::publishing;
use crate::engine::versioning::VersionEngine;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body for `POST /pages`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    #[validate(
        length(min = SLUG_MIN_LEN, max = SLUG_MAX_LEN, message = "Slug must be 3-100 characters"),
        regex(path = *SLUG_PATTERN, message = "Slug may only contain lowercase letters, numbers and hyphens")
    )]
    pub slug: String,
    #[validate(length(min = TITLE_MIN_LEN, max = TITLE_MAX_LEN, message = "Title must be 3-200 characters"))]
    pub title: String,
    /// Raw block array; defaults to empty.
    pub blocks: Option<Value>,
    #[validate(length(max = META_TITLE_MAX_LEN, message = "Meta title cannot exceed 60 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(
        max = META_DESCRIPTION_MAX_LEN,
        message = "Meta description cannot exceed 160 characters"
    ))]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_keywords: Vec<String>,
    pub og_image: Option<String>,
    pub featured_image: Option<String>,
}

/// Body for `PUT /pages/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageRequest {
    #[validate(
        length(min = SLUG_MIN_LEN, max = SLUG_MAX_LEN, message = "Slug must be 3-100 characters"),
        regex(path = *SLUG_PATTERN, message = "Slug may only contain lowercase letters, numbers and hyphens")
    )]
    pub slug: Option<String>,
    #[validate(length(min = TITLE_MIN_LEN, max = TITLE_MAX_LEN, message = "Title must be 3-200 characters"))]
    pub title: Option<String>,
    pub blocks: Option<Value>,
    #[validate(length(max = META_TITLE_MAX_LEN, message = "Meta title cannot exceed 60 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(
        max = META_DESCRIPTION_MAX_LEN,
        message = "Meta description cannot exceed 160 characters"
    ))]
    pub meta_description: Option<String>,
    pub meta_keywords: Option<Vec<String>>,
    pub og_image: Option<String>,
    pub featured_image: Option<String>,
}

/// Body for `PUT /pages/{id}/schedule`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// RFC 3339 timestamp; must be in the future.
    pub scheduled_at: Option<String>,
}

/// A page as returned by the API, with derived fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    #[serde(flatten)]
    pub page: Page,
    pub reading_time_minutes: usize,
}

impl From<Page> for PageView {
    fn from(page: Page) -> Self {
        let reading_time_minutes = reading_time_minutes(&page.blocks.0);
        Self {
            page,
            reading_time_minutes,
        }
    }
}

fn page_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Page", id })
}

/// Parse a raw block array and renumber `order` to array position.
fn parse_ordered_blocks(raw: &Value) -> Result<Vec<Block>, CoreError> {
    let mut blocks = parse_blocks(raw)?;
    if !is_order_consistent(&blocks) {
        tracing::debug!(count = blocks.len(), "Renumbering block order");
        normalize_order(&mut blocks);
    }
    Ok(blocks)
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/pages
///
/// Creates a draft page. The slug is trimmed and lowercased before
/// validation, and block `order` is rewritten to array position.
pub async fn create_page(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreatePageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PageView>>)> {
    input.slug = normalize_slug(&input.slug);
    input.validate()?;

    let blocks = match &input.blocks {
        Some(raw) => parse_ordered_blocks(raw)?,
        None => Vec::new(),
    };

    let create = CreatePage {
        slug: input.slug,
        title: input.title,
        blocks,
        meta_title: input.meta_title,
        meta_description: input.meta_description,
        meta_keywords: input.meta_keywords,
        og_image: input.og_image,
        featured_image: input.featured_image,
        author_id: Some(user.user_id),
    };
    let page = state.pages.create_page(&create).await?;

    tracing::info!(page_id = page.id, slug = %page.slug, user_id = user.user_id, "Page created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PageView::from(page),
        }),
    ))
}

/// GET /api/v1/pages/{id}
pub async fn get_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let page = state
        .pages
        .find_page(id)
        .await?
        .ok_or_else(|| page_not_found(id))?;
    Ok(Json(DataResponse {
        data: PageView::from(page),
    }))
}

/// PUT /api/v1/pages/{id}
///
/// When the body carries `blocks`, the saved content is snapshotted as an
/// `auto` version after the write. A failed snapshot does not fail the
/// update.
pub async fn update_page(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdatePageRequest>,
) -> AppResult<Json<DataResponse<PageView>>> {
    input.slug = input.slug.as_deref().map(normalize_slug);
    input.validate()?;

    let blocks = input.blocks.as_ref().map(parse_ordered_blocks).transpose()?;

    let update = UpdatePage {
        slug: input.slug,
        title: input.title,
        blocks,
        meta_title: input.meta_title,
        meta_description: input.meta_description,
        meta_keywords: input.meta_keywords,
        og_image: input.og_image,
        featured_image: input.featured_image,
    };
    let mut page = state
        .pages
        .update_page(id, &update)
        .await?
        .ok_or_else(|| page_not_found(id))?;

    if update.touches_content() {
        let engine = VersionEngine::from_state(&state);
        if let Some(version) = engine.autosave(&page, Some(user.user_id)).await {
            page.current_version = version.version_number;
            page.redo_stack.clear();
        }
    }

    Ok(Json(DataResponse {
        data: PageView::from(page),
    }))
}

/// DELETE /api/v1/pages/{id}
///
/// Deletes the page and then, best-effort, its version history.
pub async fn delete_page(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !state.pages.delete_page(id).await? {
        return Err(page_not_found(id));
    }
    VersionEngine::from_state(&state)
        .delete_all_versions(id)
        .await;

    tracing::info!(page_id = id, user_id = user.user_id, "Page deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// PUT /api/v1/pages/{id}/publish
pub async fn publish_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let page = publishing::publish(state.pages.as_ref(), id, Utc::now()).await?;
    Ok(Json(DataResponse {
        data: PageView::from(page),
    }))
}

/// PUT /api/v1/pages/{id}/unpublish
pub async fn unpublish_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let page = publishing::unpublish(state.pages.as_ref(), id).await?;
    Ok(Json(DataResponse {
        data: PageView::from(page),
    }))
}

/// PUT /api/v1/pages/{id}/schedule
pub async fn schedule_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ScheduleRequest>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let at = parse_scheduled_at(input.scheduled_at.as_deref())?;
    let page = publishing::schedule(state.pages.as_ref(), id, at, Utc::now()).await?;
    Ok(Json(DataResponse {
        data: PageView::from(page),
    }))
}
