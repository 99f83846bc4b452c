//! Minimal TODO list REST service.
//!
//! Clients create, list, update and delete TODO items persisted in SQLite.
//!
//! ```text
//! POST   /todos  {"subject","description"}      -> {"todo": TODO}
//! GET    /todos  ?prev_id=&size=                 -> {"todos": [TODO...]}
//! PUT    /todos  {"id","subject","description"}  -> {"todo": TODO}
//! DELETE /todos  {"ids": [...]}                  -> {}
//! GET    /healthz                                -> {"message": "OK"}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`model`]: TODO record and request/response bodies
//! - [`service`]: SQLite pool and TODO persistence
//! - [`api`]: HTTP handlers and router
//! - [`metrics`]: Prometheus counters and latency
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod service;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result, TodoError};
