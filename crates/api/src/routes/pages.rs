//! Route definitions for the `/pages` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Routes mounted at `/pages`.
///
/// ```text
/// POST   /                      create_page
/// GET    /{id}                  get_page
/// PUT    /{id}                  update_page (autosaves when blocks change)
/// DELETE /{id}                  delete_page
/// PUT    /{id}/publish          publish_page
/// PUT    /{id}/unpublish        unpublish_page
/// PUT    /{id}/schedule         schedule_page
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(pages::create_page))
        .route(
            "/{id}",
            get(pages::get_page)
                .put(pages::update_page)
                .delete(pages::delete_page),
        )
        .route("/{id}/publish", put(pages::publish_page))
        .route("/{id}/unpublish", put(pages::unpublish_page))
        .route("/{id}/schedule", put(pages::schedule_page))
}
