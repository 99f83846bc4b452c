//! Persistence layer.
//!
//! This module handles:
//! - Pool construction and schema bootstrap
//! - CRUD operations over TODO records

pub mod db;
pub mod todo;

pub use db::{connect, connect_in_memory, init_schema, open};
pub use todo::TodoService;
