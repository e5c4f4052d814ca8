//! Feed poller API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use feedrelay_core::{CycleReport, PollerStatus};

use super::ErrorResponse;
use crate::state::AppState;

/// Poller status response
#[derive(Debug, Serialize)]
pub struct PollerStatusResponse {
    /// Whether the poller is wired (its dependencies are configured)
    pub available: bool,
    #[serde(flatten)]
    pub status: PollerStatus,
}

/// GET /api/v1/poller/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PollerStatusResponse> {
    match state.scheduler() {
        Some(scheduler) => Json(PollerStatusResponse {
            available: true,
            status: scheduler.status().await,
        }),
        None => Json(PollerStatusResponse {
            available: false,
            status: PollerStatus::default(),
        }),
    }
}

/// POST /api/v1/poller/run
///
/// Run a cycle now and return its report. Waits for a running cycle first.
pub async fn run_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleReport>, impl IntoResponse> {
    let Some(scheduler) = state.scheduler() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Feed poller not available. Check that [tmdb] is configured.".to_string(),
            }),
        ));
    };

    scheduler.run_now().await.map(Json).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })
}
