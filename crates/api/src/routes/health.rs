use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`. Always served with 200 so load balancers can
/// tell a slow store apart from a dead process.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while the page store does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// Pings the page store once per call; nothing is cached.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match state.pages.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Page store ping failed");
            false
        }
    };

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// `/health` lives beside `/api/v1`, outside the versioned API.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
