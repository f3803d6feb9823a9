//! REST API over the senior-care `clients` table: list, fetch, create,
//! partial update and soft delete.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use api::{AppState, build_router};
