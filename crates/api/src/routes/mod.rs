pub mod health;
pub mod pages;
pub mod versions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route requires a bearer token with the `admin` role.
///
/// ```text
/// /pages                                 create (POST)
/// /pages/{id}                            get, update, delete
/// /pages/{id}/publish                    publish now (PUT)
/// /pages/{id}/unpublish                  back to draft (PUT)
/// /pages/{id}/schedule                   arm scheduled publish (PUT)
///
/// /versions/history/{page_id}            list snapshots (GET)
/// /versions/{version_id}                 get, delete
/// /versions/restore/{version_id}         restore blocks (POST)
/// /versions/undo/{page_id}               undo (POST)
/// /versions/redo/{page_id}               redo (POST)
/// /versions/pages/{page_id}/snapshot     manual snapshot (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pages", pages::router())
        .nest("/versions", versions::router())
}
