//! Unified error types for the TODO service.

use thiserror::Error;
use time::OffsetDateTime;

/// Process-level error: startup, configuration and serving.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database connection or schema error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a failed TODO service operation.
///
/// The variants are matched directly by the HTTP layer to pick a status code.
#[derive(Error, Debug)]
pub enum TodoError {
    /// The operation targeted an id that does not exist.
    #[error("todo {id} not found")]
    NotFound {
        /// The missing identifier.
        id: i64,
        /// When the lookup failed.
        when: OffsetDateTime,
    },

    /// An argument was outside the accepted range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store rejected or failed the statement.
    #[error("{op} failed{}: {source}", .id.map(|id| format!(" for todo {id}")).unwrap_or_default())]
    Persistence {
        /// Operation name (`create`, `read`, `update`, `delete`).
        op: &'static str,
        /// Identifier involved, when there is one.
        id: Option<i64>,
        /// Underlying store error.
        #[source]
        source: sqlx::Error,
    },
}

impl TodoError {
    /// Build a not-found outcome stamped with the current time.
    pub fn not_found(id: i64) -> Self {
        Self::NotFound {
            id,
            when: OffsetDateTime::now_utc(),
        }
    }

    /// Wrap a store error with the operation that produced it.
    pub fn persistence(op: &'static str, id: Option<i64>, source: sqlx::Error) -> Self {
        Self::Persistence { op, id, source }
    }
}

/// Convenient Result type alias for process-level code.
pub type Result<T> = std::result::Result<T, AppError>;
