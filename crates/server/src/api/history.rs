//! History API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use feedrelay_core::HistoryRecord;

use super::middleware::AuthUser;
use super::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HistoryListResponse {
    pub records: Vec<HistoryRecord>,
    pub total: usize,
}

/// Outcome of a history mutation.
#[derive(Debug, Serialize)]
pub struct HistoryActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/history
///
/// List processed entries, newest first.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HistoryListResponse>, impl IntoResponse> {
    match state.history().list().await {
        Ok(mut records) => {
            records.reverse();
            let total = records.len();
            Ok(Json(HistoryListResponse { records, total }))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// DELETE /api/v1/history/{key}
///
/// Delete every record whose display title is `key`.
pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("History delete of '{}' requested by {}", key, user);
    let result = match state.scheduler() {
        Some(scheduler) => scheduler
            .poller()
            .delete_history(&key)
            .await
            .map_err(|e| e.to_string()),
        None => state
            .history()
            .delete_by_key(&key)
            .await
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(true) => (
            StatusCode::OK,
            Json(HistoryActionResponse {
                success: true,
                message: None,
            }),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(HistoryActionResponse {
                success: false,
                message: Some(format!("No history record titled '{}'", key)),
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HistoryActionResponse {
                success: false,
                message: Some(e),
            }),
        ),
    }
}

/// POST /api/v1/history/clear
///
/// Arm the one-shot clear: the next cycle starts from an empty history and
/// overwrites the stored one.
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> impl IntoResponse {
    match state.scheduler() {
        Some(scheduler) => {
            scheduler.poller().request_clear();
            info!("History clear armed by {}", user);
            (
                StatusCode::ACCEPTED,
                Json(HistoryActionResponse {
                    success: true,
                    message: Some("History will be cleared on the next cycle".to_string()),
                }),
            )
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HistoryActionResponse {
                success: false,
                message: Some("Feed poller not available".to_string()),
            }),
        ),
    }
}
