//! taskdeck — a small multi-user kanban task board.
//!
//! Server side: an axum REST gateway over SQLite-backed credential and task
//! stores, with HMAC-signed 24-hour bearer tokens. Client side: an in-memory
//! board state controller that applies optimistic updates and rolls back on
//! failed calls.

pub mod auth;
pub mod board;
pub mod config;
pub mod gateway;
pub mod tasks;
pub mod token;

pub use config::Config;
pub use gateway::{run_gateway, AppState};
