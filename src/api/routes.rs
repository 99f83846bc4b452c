//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_todo, delete_todos, healthz, not_found, prometheus_metrics, read_todos, update_todo,
    AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let timeout = state.request_timeout;

    Router::new()
        // Liveness
        .route("/healthz", get(healthz))
        // TODO CRUD, dispatched by method
        .route(
            "/todos",
            get(read_todos)
                .post(create_todo)
                .put(update_todo)
                .delete(delete_todos),
        )
        .route("/metrics", get(prometheus_metrics))
        .fallback(not_found)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
