//! Route definitions for the `/versions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::versions;
use crate::state::AppState;

/// Routes mounted at `/versions`.
///
/// ```text
/// GET    /history/{page_id}           get_history (?save_type=)
/// GET    /{version_id}                get_version
/// DELETE /{version_id}                delete_version
/// POST   /restore/{version_id}        restore_version
/// POST   /undo/{page_id}              undo
/// POST   /redo/{page_id}              redo
/// POST   /pages/{page_id}/snapshot    create_snapshot
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history/{page_id}", get(versions::get_history))
        .route(
            "/{version_id}",
            get(versions::get_version).delete(versions::delete_version),
        )
        .route("/restore/{version_id}", post(versions::restore_version))
        .route("/undo/{page_id}", post(versions::undo))
        .route("/redo/{page_id}", post(versions::redo))
        .route("/pages/{page_id}/snapshot", post(versions::create_snapshot))
}
