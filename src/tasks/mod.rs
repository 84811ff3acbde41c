//! Task records and their SQLite-backed store.
//!
//! Every read and write is scoped by owner: a task id belonging to another
//! user is indistinguishable from a missing one.

pub mod store;

pub use store::{Task, TaskDraft, TaskPatch, TaskStatus, TaskStore, TaskStoreError};
