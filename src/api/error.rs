//! Mapping of service outcomes to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::TodoError;
use crate::metrics;

/// A request that could not be answered with a success body.
///
/// Responses carry only the plain-text status line; details stay in the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Undecodable body/query or a missing required field.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The targeted TODO does not exist.
    #[error("todo {0} not found")]
    NotFound(i64),

    /// Any store failure.
    #[error("internal error: {0}")]
    Internal(TodoError),
}

impl ApiError {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound { id, .. } => ApiError::NotFound(id),
            TodoError::Validation(reason) => ApiError::BadRequest(reason),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::BadRequest(reason) => debug!(%reason, "Rejected request"),
            ApiError::NotFound(id) => info!(id, "Todo not found"),
            ApiError::Internal(err) => error!(error = %err, "Request failed"),
        }
        metrics::inc_requests_failed(status.as_u16());

        (status, status.to_string()).into_response()
    }
}
