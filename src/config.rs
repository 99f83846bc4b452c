//! Application configuration loaded from environment variables.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Upper bound on how long a connection waits on a locked database.
const MAX_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Storage ===
    /// SQLite connection URL (`DATABASE_URL`).
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum pooled connections (`DB_MAX_CONNECTIONS`).
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    // === Server Configuration ===
    /// HTTP listen port (`PORT`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request deadline in seconds (`REQUEST_TIMEOUT_SECS`).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_database_url() -> String {
    "sqlite://.sqlite3/todo.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            db_max_connections: default_max_connections(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("DATABASE_URL is required".to_string());
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err("DATABASE_URL must be a sqlite: URL".to_string());
        }

        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long a statement may wait on a locked database.
    ///
    /// Never longer than the request deadline, so a blocked write fails
    /// inside the request instead of outliving it.
    pub fn busy_timeout(&self) -> Duration {
        self.request_timeout().min(MAX_BUSY_TIMEOUT)
    }

    /// Parent directory of a file-backed database, if it has one.
    pub fn database_dir(&self) -> Option<&Path> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next()?;
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Path::new(path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_sqlite_url() {
        let config = Config {
            database_url: "postgres://localhost/todo".to_string(),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_connections() {
        let config = Config {
            db_max_connections: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn busy_timeout_is_bounded_by_request_deadline() {
        let config = Config {
            request_timeout_secs: 2,
            ..Config::default()
        };
        assert_eq!(config.busy_timeout(), Duration::from_secs(2));

        assert_eq!(Config::default().busy_timeout(), MAX_BUSY_TIMEOUT);
    }

    #[test]
    fn database_dir_of_file_url() {
        let config = Config::default();
        assert_eq!(config.database_dir(), Some(Path::new(".sqlite3")));

        let config = Config {
            database_url: "sqlite:data/todo.db?mode=rwc".to_string(),
            ..Config::default()
        };
        assert_eq!(config.database_dir(), Some(Path::new("data")));
    }

    #[test]
    fn database_dir_of_memory_or_bare_file() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            ..Config::default()
        };
        assert_eq!(config.database_dir(), None);

        let config = Config {
            database_url: "sqlite://todo.db".to_string(),
            ..Config::default()
        };
        assert_eq!(config.database_dir(), None);
    }
}
