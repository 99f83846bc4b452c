//! CRUD of TODO records.
//!
//! [`TodoService`] is the only code that issues SQL against the `todos`
//! table. Writes run inside a transaction: if the returned future is
//! dropped (client gone, request deadline hit) before commit, the dropped
//! [`sqlx::Transaction`] queues a `ROLLBACK` behind the pending statement,
//! so a cancelled request leaves no row behind.

use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use crate::error::TodoError;
use crate::metrics;
use crate::model::todo::to_unix_micros;
use crate::model::{Todo, TodoRow};

/// Ids bound per `DELETE` statement; stays below SQLite's parameter limit.
const MAX_IDS_PER_STATEMENT: usize = 500;

const INSERT: &str = "INSERT INTO todos(subject, description, created_at, updated_at) \
     VALUES (?, ?, ?, ?) \
     RETURNING id, subject, description, created_at, updated_at";

const READ: &str = "SELECT id, subject, description, created_at, updated_at \
     FROM todos ORDER BY id DESC LIMIT ?";

const READ_WITH_ID: &str = "SELECT id, subject, description, created_at, updated_at \
     FROM todos WHERE id < ? ORDER BY id DESC LIMIT ?";

// updated_at must strictly grow even if the clock stalls or steps back.
const UPDATE: &str = "UPDATE todos \
     SET subject = ?, description = ?, updated_at = MAX(?, updated_at + 1) \
     WHERE id = ? \
     RETURNING id, subject, description, created_at, updated_at";

/// Service implementing CRUD of TODO entities.
#[derive(Debug, Clone)]
pub struct TodoService {
    pool: SqlitePool,
}

impl TodoService {
    /// Create a service over an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a TODO and return the stored row.
    ///
    /// Insert and read-back happen in one `INSERT ... RETURNING` statement
    /// inside a transaction, so a failure or cancellation means no row was
    /// written.
    #[instrument(skip(self, subject, description))]
    pub async fn create_todo(&self, subject: &str, description: &str) -> Result<Todo, TodoError> {
        let now = to_unix_micros(OffsetDateTime::now_utc());

        let fail = |e: sqlx::Error| {
            error!(op = "create", error = %e, "Insert failed");
            TodoError::persistence("create", None, e)
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;
        let row: TodoRow = sqlx::query_as(INSERT)
            .bind(subject)
            .bind(description)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(fail)?;
        tx.commit().await.map_err(fail)?;

        let todo = into_todo("create", row)?;
        metrics::inc_todos_created();
        info!(id = todo.id, "Created todo");
        Ok(todo)
    }

    /// Read up to `size` TODOs, newest first.
    ///
    /// `prev_id == 0` starts from the newest row; any other value returns
    /// only rows with `id < prev_id`.
    #[instrument(skip(self))]
    pub async fn read_todos(&self, prev_id: i64, size: i64) -> Result<Vec<Todo>, TodoError> {
        if size <= 0 {
            return Err(TodoError::Validation(format!(
                "page size must be positive (got {size})"
            )));
        }

        let query = if prev_id == 0 {
            sqlx::query_as::<_, TodoRow>(READ).bind(size)
        } else {
            sqlx::query_as::<_, TodoRow>(READ_WITH_ID).bind(prev_id).bind(size)
        };

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            error!(op = "read", prev_id, error = %e, "Select failed");
            TodoError::persistence("read", (prev_id != 0).then_some(prev_id), e)
        })?;

        debug!(count = rows.len(), "Read todos");
        rows.into_iter().map(|row| into_todo("read", row)).collect()
    }

    /// Replace subject and description of an existing TODO.
    ///
    /// Returns [`TodoError::NotFound`] when `id` does not exist; no row is
    /// created in that case.
    #[instrument(skip(self, subject, description))]
    pub async fn update_todo(
        &self,
        id: i64,
        subject: &str,
        description: &str,
    ) -> Result<Todo, TodoError> {
        let now = to_unix_micros(OffsetDateTime::now_utc());

        let fail = |e: sqlx::Error| {
            error!(op = "update", id, error = %e, "Update failed");
            TodoError::persistence("update", Some(id), e)
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;
        let row: Option<TodoRow> = sqlx::query_as(UPDATE)
            .bind(subject)
            .bind(description)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(fail)?;
        tx.commit().await.map_err(fail)?;

        let Some(row) = row else {
            warn!(id, "Update target not found");
            return Err(TodoError::not_found(id));
        };

        let todo = into_todo("update", row)?;
        metrics::inc_todos_updated();
        info!(id, "Updated todo");
        Ok(todo)
    }

    /// Delete every TODO whose id is in `ids`.
    ///
    /// Unknown ids are ignored and an empty slice is a no-op. All chunks run
    /// in one transaction. Returns the number of rows removed.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn delete_todos(&self, ids: &[i64]) -> Result<u64, TodoError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let fail = |e: sqlx::Error| {
            error!(op = "delete", ?ids, error = %e, "Delete failed");
            TodoError::persistence("delete", ids.first().copied(), e)
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;
        let mut deleted = 0;

        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let mut builder: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("DELETE FROM todos WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let result = builder.build().execute(&mut *tx).await.map_err(fail)?;
            deleted += result.rows_affected();
        }

        tx.commit().await.map_err(fail)?;

        metrics::inc_todos_deleted(deleted);
        info!(deleted, "Deleted todos");
        Ok(deleted)
    }
}

fn into_todo(op: &'static str, row: TodoRow) -> Result<Todo, TodoError> {
    let id = row.id;
    Todo::try_from(row).map_err(|e| {
        error!(op, id, error = %e, "Stored timestamp out of range");
        TodoError::persistence(op, Some(id), sqlx::Error::Decode(Box::new(e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::db::{connect_in_memory, init_schema};
    use pretty_assertions::assert_eq;

    async fn service() -> TodoService {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        TodoService::new(pool)
    }

    async fn seed(svc: &TodoService, count: usize) -> Vec<Todo> {
        let mut todos = Vec::with_capacity(count);
        for i in 0..count {
            todos.push(svc.create_todo(&format!("todo {i}"), "").await.unwrap());
        }
        todos
    }

    async fn count_rows(svc: &TodoService) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(svc.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_stored_row() {
        let svc = service().await;

        let todo = svc.create_todo("buy milk", "2 liters").await.unwrap();

        assert!(todo.id > 0);
        assert_eq!(todo.subject, "buy milk");
        assert_eq!(todo.description, "2 liters");
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let svc = service().await;
        let todos = seed(&svc, 3).await;

        assert!(todos[0].id < todos[1].id);
        assert!(todos[1].id < todos[2].id);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let svc = service().await;
        let first = svc.create_todo("a", "").await.unwrap();
        svc.delete_todos(&[first.id]).await.unwrap();

        let second = svc.create_todo("b", "").await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn read_returns_newest_first_limited_to_size() {
        let svc = service().await;
        let todos = seed(&svc, 5).await;

        let page = svc.read_todos(0, 2).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0], todos[4]);
        assert_eq!(page[1], todos[3]);
    }

    #[tokio::test]
    async fn read_with_prev_id_is_exclusive() {
        let svc = service().await;
        let todos = seed(&svc, 5).await;
        let cursor = todos[3].id;

        let page = svc.read_todos(cursor, 10).await.unwrap();

        let ids: Vec<i64> = page.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![todos[2].id, todos[1].id, todos[0].id]);
        assert!(ids.iter().all(|id| *id < cursor));
    }

    #[tokio::test]
    async fn paging_is_stable_under_concurrent_inserts() {
        let svc = service().await;
        seed(&svc, 4).await;

        let first = svc.read_todos(0, 2).await.unwrap();
        svc.create_todo("late arrival", "").await.unwrap();
        let cursor = first.last().unwrap().id;
        let second = svc.read_todos(cursor, 2).await.unwrap();

        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|t| t.id < cursor));
        assert!(second.iter().all(|t| t.subject != "late arrival"));
    }

    #[tokio::test]
    async fn read_rejects_non_positive_size() {
        let svc = service().await;

        for size in [0, -1] {
            let err = svc.read_todos(0, size).await.unwrap_err();
            assert!(matches!(err, TodoError::Validation(_)), "{err}");
        }
    }

    #[tokio::test]
    async fn read_empty_table() {
        let svc = service().await;
        assert!(svc.read_todos(0, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_only() {
        let svc = service().await;
        let created = svc.create_todo("old", "old description").await.unwrap();

        let updated = svc.update_todo(created.id, "new", "").await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.subject, "new");
        assert_eq!(updated.description, "");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn repeated_updates_strictly_increase_updated_at() {
        let svc = service().await;
        let created = svc.create_todo("s", "").await.unwrap();

        let mut last = created.updated_at;
        for i in 0..5 {
            let todo = svc.update_todo(created.id, &format!("s{i}"), "").await.unwrap();
            assert!(todo.updated_at > last);
            last = todo.updated_at;
        }
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found_and_creates_nothing() {
        let svc = service().await;

        let err = svc.update_todo(9999, "x", "").await.unwrap_err();

        match err {
            TodoError::NotFound { id, .. } => assert_eq!(id, 9999),
            other => panic!("expected not found, got {other}"),
        }
        assert_eq!(count_rows(&svc).await, 0);
    }

    #[tokio::test]
    async fn delete_removes_only_existing_ids() {
        let svc = service().await;
        let todos = seed(&svc, 3).await;

        let deleted = svc
            .delete_todos(&[todos[0].id, todos[2].id, 4242])
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        let remaining = svc.read_todos(0, 10).await.unwrap();
        assert_eq!(remaining, vec![todos[1].clone()]);
    }

    #[tokio::test]
    async fn delete_empty_set_is_noop() {
        let svc = service().await;
        seed(&svc, 2).await;

        assert_eq!(svc.delete_todos(&[]).await.unwrap(), 0);
        assert_eq!(count_rows(&svc).await, 2);
    }

    #[tokio::test]
    async fn delete_spans_multiple_statements() {
        let svc = service().await;
        let todos = seed(&svc, 3).await;

        let mut ids: Vec<i64> = (10_000..10_000 + MAX_IDS_PER_STATEMENT as i64 * 2).collect();
        ids.extend(todos.iter().map(|t| t.id));

        assert_eq!(svc.delete_todos(&ids).await.unwrap(), 3);
        assert_eq!(count_rows(&svc).await, 0);
    }

    #[tokio::test]
    async fn closed_pool_reports_persistence_error() {
        let svc = service().await;
        svc.pool().close().await;

        let err = svc.read_todos(0, 5).await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence { op: "read", .. }), "{err}");

        let err = svc.create_todo("x", "").await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence { op: "create", .. }), "{err}");
    }
}
