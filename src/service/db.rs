//! SQLite pool construction and schema bootstrap.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::Config;

const CREATE_TODOS: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    subject     TEXT    NOT NULL,
    description TEXT    NOT NULL DEFAULT '',
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    CHECK (created_at <= updated_at)
)
"#;

/// Open a connection pool for the configured database, creating the file if needed.
pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    if let Some(dir) = config.database_dir() {
        std::fs::create_dir_all(dir)?;
    }

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout());

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(options)
        .await?;

    info!(
        url = %config.database_url,
        max_connections = config.db_max_connections,
        busy_timeout_ms = config.busy_timeout().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Connect and make sure the schema exists.
pub async fn open(config: &Config) -> crate::Result<SqlitePool> {
    let pool = connect(config).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Open a single-connection in-memory database.
///
/// Every SQLite in-memory connection is its own database, so the pool is
/// pinned to one connection that never expires.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Create the `todos` table if it does not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TODOS).execute(pool).await?;
    debug!("Schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn open_creates_schema() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Config::default()
        };

        let pool = open(&config).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn schema_rejects_updated_before_created() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO todos(subject, description, created_at, updated_at) VALUES ('s', '', 10, 9)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
