//! Subscription API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use feedrelay_core::Subscription;

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<Subscription>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// GET /api/v1/subscriptions
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SubscriptionListResponse>, impl IntoResponse> {
    match state.subscriptions().list() {
        Ok(subscriptions) => {
            let total = subscriptions.len();
            Ok(Json(SubscriptionListResponse {
                subscriptions,
                total,
            }))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// DELETE /api/v1/subscriptions/{id}
pub async fn remove_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, impl IntoResponse> {
    match state.subscriptions().remove(&id) {
        Ok(true) => Ok(Json(SuccessResponse {
            message: format!("Removed subscription {}", id),
        })),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Subscription not found: {}", id),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
