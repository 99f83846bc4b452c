//! HTTP API handlers.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::metrics::RequestTimer;
use crate::model::{
    CreateTodoRequest, CreateTodoResponse, DeleteTodoRequest, DeleteTodoResponse,
    HealthzResponse, ReadTodoRequest, ReadTodoResponse, UpdateTodoRequest, UpdateTodoResponse,
};
use crate::service::TodoService;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// TODO persistence.
    pub todos: TodoService,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Deadline applied to every request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Create new app state around a TODO service.
    pub fn new(todos: TodoService) -> Self {
        Self {
            todos,
            metrics: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Expose metrics rendered by `handle` at `/metrics`.
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Override the per-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Health check handler - always returns 200.
pub async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse::ok())
}

/// `POST /todos`: create a TODO.
pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateTodoResponse>, ApiError> {
    let _timer = RequestTimer::new("POST /todos");

    let req: CreateTodoRequest = decode(&body)?;
    if req.subject.is_empty() {
        return Err(ApiError::BadRequest("subject is required".to_string()));
    }

    let todo = state
        .todos
        .create_todo(&req.subject, &req.description)
        .await?;

    Ok(Json(CreateTodoResponse { todo }))
}

/// `GET /todos?prev_id=&size=`: page through TODOs, newest first.
pub async fn read_todos(
    State(state): State<AppState>,
    query: Result<Query<ReadTodoRequest>, QueryRejection>,
) -> Result<Json<ReadTodoResponse>, ApiError> {
    let _timer = RequestTimer::new("GET /todos");

    let Query(req) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let todos = state.todos.read_todos(req.prev_id, req.size).await?;

    Ok(Json(ReadTodoResponse { todos }))
}

/// `PUT /todos`: replace subject and description of a TODO.
pub async fn update_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateTodoResponse>, ApiError> {
    let _timer = RequestTimer::new("PUT /todos");

    let req: UpdateTodoRequest = decode(&body)?;
    if req.id == 0 {
        return Err(ApiError::BadRequest("id is required".to_string()));
    }
    if req.subject.is_empty() {
        return Err(ApiError::BadRequest("subject is required".to_string()));
    }

    let todo = state
        .todos
        .update_todo(req.id, &req.subject, &req.description)
        .await?;

    Ok(Json(UpdateTodoResponse { todo }))
}

/// `DELETE /todos`: remove TODOs by id.
pub async fn delete_todos(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeleteTodoResponse>, ApiError> {
    let _timer = RequestTimer::new("DELETE /todos");

    let req: DeleteTodoRequest = decode(&body)?;

    state.todos.delete_todos(&req.ids).await?;

    Ok(Json(DeleteTodoResponse {}))
}

/// Prometheus scrape endpoint - 404 when no recorder is installed.
pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => not_found().await.into_response(),
    }
}

/// Fallback for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, StatusCode::NOT_FOUND.to_string())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}
