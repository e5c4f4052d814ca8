pub mod handlers;
pub mod history;
pub mod middleware;
pub mod poller;
pub mod routes;
pub mod subscriptions;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by the API handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
