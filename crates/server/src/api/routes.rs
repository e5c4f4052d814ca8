use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, history, poller, subscriptions};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Authenticated API routes
    let protected = Router::new()
        .route("/config", get(handlers::get_config))
        // History
        .route("/history", get(history::list_history))
        .route("/history/clear", post(history::clear_history))
        .route("/history/{key}", delete(history::delete_history))
        // Poller
        .route("/poller/status", get(poller::get_status))
        .route("/poller/run", post(poller::run_now))
        // Subscriptions
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route(
            "/subscriptions/{id}",
            delete(subscriptions::remove_subscription),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
