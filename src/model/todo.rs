//! TODO record and the request/response bodies of the `/todos` endpoints.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Page size used by `GET /todos` when the client omits `size`.
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// A persisted task.
///
/// `id` is assigned by the store and never reused. `created_at` is fixed at
/// insert time; `updated_at` starts equal to it and grows on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identifier.
    pub id: i64,
    /// Short title, never empty once persisted through the API.
    pub subject: String,
    /// Free-form details, may be empty.
    pub description: String,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last modification time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Raw `todos` row as stored in SQLite.
///
/// Timestamps are unix microseconds so that ordering and the
/// `updated_at + 1` bump can be done inside a single statement.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TodoRow {
    /// Primary key.
    pub id: i64,
    /// Subject column.
    pub subject: String,
    /// Description column.
    pub description: String,
    /// Creation time in unix microseconds.
    pub created_at: i64,
    /// Update time in unix microseconds.
    pub updated_at: i64,
}

impl TryFrom<TodoRow> for Todo {
    type Error = time::error::ComponentRange;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            subject: row.subject,
            description: row.description,
            created_at: from_unix_micros(row.created_at)?,
            updated_at: from_unix_micros(row.updated_at)?,
        })
    }
}

/// Convert a timestamp to unix microseconds, the storage resolution.
pub fn to_unix_micros(at: OffsetDateTime) -> i64 {
    let micros = at.unix_timestamp_nanos() / 1_000;
    i64::try_from(micros).unwrap_or(i64::MAX)
}

/// Convert stored unix microseconds back to a UTC timestamp.
pub fn from_unix_micros(micros: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTodoRequest {
    /// Required, must be non-empty.
    pub subject: String,
    /// Optional.
    pub description: String,
}

/// Response of `POST /todos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoResponse {
    /// The stored TODO.
    pub todo: Todo,
}

/// Query of `GET /todos`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadTodoRequest {
    /// Exclusive upper bound on `id`; 0 starts from the newest item.
    pub prev_id: i64,
    /// Maximum number of items to return.
    pub size: i64,
}

impl Default for ReadTodoRequest {
    fn default() -> Self {
        Self {
            prev_id: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Response of `GET /todos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadTodoResponse {
    /// Items ordered by `id` descending.
    pub todos: Vec<Todo>,
}

/// Body of `PUT /todos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTodoRequest {
    /// Target item; 0 is treated as missing.
    pub id: i64,
    /// Required, must be non-empty.
    pub subject: String,
    /// Replacement description.
    pub description: String,
}

/// Response of `PUT /todos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodoResponse {
    /// The TODO after the update.
    pub todo: Todo,
}

/// Body of `DELETE /todos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteTodoRequest {
    /// Ids to remove; unknown ids are ignored.
    pub ids: Vec<i64>,
}

/// Response of `DELETE /todos`, always `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteTodoResponse {}
