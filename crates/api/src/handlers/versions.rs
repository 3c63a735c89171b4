//! Handlers for the `/versions` resource: history, snapshots, undo/redo
//! and restore.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use futures::TryStreamExt;
use pagecraft_core::history::SaveType;
use pagecraft_core::types::DbId;
use pagecraft_db::models::page_version::{PageVersion, VersionSummary};
use serde::Deserialize;

use crate::engine::versioning::{HistoryMove, VersionEngine};
use crate::error::AppResult;
use crate::handlers::pages::PageView;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Query parameters for `GET /versions/history/{page_id}`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub save_type: Option<SaveType>,
}

/// Body for `POST /versions/pages/{page_id}/snapshot`.
#[derive(Debug, Default, Deserialize)]
pub struct SnapshotRequest {
    pub note: Option<String>,
}

/// GET /api/v1/versions/history/{page_id}
///
/// Most recent first. An unknown page yields an empty list.
pub async fn get_history(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<ListResponse<VersionSummary>>> {
    let versions: Vec<VersionSummary> = VersionEngine::from_state(&state)
        .history(page_id, params.save_type)
        .try_collect()
        .await?;
    Ok(Json(ListResponse::from(versions)))
}

/// GET /api/v1/versions/{version_id}
pub async fn get_version(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageVersion>>> {
    let version = VersionEngine::from_state(&state)
        .get_version(version_id)
        .await?;
    Ok(Json(DataResponse { data: version }))
}

/// POST /api/v1/versions/restore/{version_id}
pub async fn restore_version(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let page = VersionEngine::from_state(&state).restore(version_id).await?;
    tracing::debug!(version_id, user_id = user.user_id, "Restore requested");
    Ok(Json(DataResponse {
        data: PageView::from(page),
    }))
}

/// POST /api/v1/versions/undo/{page_id}
pub async fn undo(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
) -> AppResult<Json<DataResponse<HistoryMove>>> {
    let moved = VersionEngine::from_state(&state).undo(page_id).await?;
    Ok(Json(DataResponse { data: moved }))
}

/// POST /api/v1/versions/redo/{page_id}
pub async fn redo(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
) -> AppResult<Json<DataResponse<HistoryMove>>> {
    let moved = VersionEngine::from_state(&state).redo(page_id).await?;
    Ok(Json(DataResponse { data: moved }))
}

/// POST /api/v1/versions/pages/{page_id}/snapshot
pub async fn create_snapshot(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(page_id): Path<DbId>,
    Json(input): Json<SnapshotRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PageVersion>>)> {
    let version = VersionEngine::from_state(&state)
        .snapshot(page_id, Some(user.user_id), input.note)
        .await?;
    tracing::info!(
        page_id,
        version_number = version.version_number,
        user_id = user.user_id,
        "Manual snapshot saved"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// DELETE /api/v1/versions/{version_id}
pub async fn delete_version(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<StatusCode> {
    VersionEngine::from_state(&state)
        .delete_version(version_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
