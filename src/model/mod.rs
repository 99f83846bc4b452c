//! Wire and persistence types for TODO items.
//!
//! This module handles:
//! - The canonical [`Todo`] record returned to clients
//! - Request/response bodies for the `/todos` endpoints
//! - The health check response

pub mod healthz;
pub mod todo;

pub use healthz::HealthzResponse;
pub use todo::{
    CreateTodoRequest, CreateTodoResponse, DeleteTodoRequest, DeleteTodoResponse,
    ReadTodoRequest, ReadTodoResponse, Todo, TodoRow, UpdateTodoRequest, UpdateTodoResponse,
    DEFAULT_PAGE_SIZE,
};
