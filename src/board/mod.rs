//! Client-side board state with optimistic updates.
//!
//! The board keeps the authenticated user's full task list in memory. Every
//! mutating user action follows the same shape: snapshot the current state,
//! apply the change locally, issue the API call, then either reconcile with
//! the server's representation or restore the snapshot and surface a
//! notice. Deletion adds an explicit confirmation stage before any of that
//! begins; a pending confirmation is cancellable with no state change.

pub mod client;

pub use client::{login, ApiError, HttpTaskApi, TaskApi};

use crate::tasks::{Task, TaskDraft, TaskPatch, TaskStatus};
use chrono::Utc;
use std::sync::Arc;

/// Titles shorter than this (trimmed) are rejected before any state change.
pub const MIN_TITLE_CHARS: usize = 3;

/// The full in-memory task list. `PartialEq` so rollback can be asserted as
/// exact equality against a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    pub tasks: Vec<Task>,
}

/// A user-initiated board mutation, applied optimistically.
#[derive(Debug, Clone)]
pub enum BoardAction {
    Create { task: Task },
    Edit { id: String, patch: TaskPatch },
    Move { id: String, status: TaskStatus },
    Delete { id: String },
}

impl BoardState {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Tasks in one column, in list order.
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Pure transition: current state + action → next state. Unknown ids
    /// leave the state untouched.
    pub fn apply(&self, action: &BoardAction) -> BoardState {
        let mut next = self.clone();
        match action {
            BoardAction::Create { task } => next.tasks.push(task.clone()),
            BoardAction::Edit { id, patch } => {
                if let Some(task) = next.tasks.iter_mut().find(|t| t.id == *id) {
                    if let Some(title) = &patch.title {
                        task.title = title.trim().to_string();
                    }
                    if let Some(description) = &patch.description {
                        task.description = description.trim().to_string();
                    }
                    if let Some(status) = patch.status {
                        task.status = status;
                    }
                }
            }
            BoardAction::Move { id, status } => {
                if let Some(task) = next.tasks.iter_mut().find(|t| t.id == *id) {
                    task.status = *status;
                }
            }
            BoardAction::Delete { id } => next.tasks.retain(|t| t.id != *id),
        }
        next
    }

    /// Swap in the server's representation of a task, matched by id.
    fn replace(&mut self, id: &str, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == id) {
            *slot = task;
        }
    }
}

/// Drives the board against a [`TaskApi`].
pub struct BoardController {
    api: Arc<dyn TaskApi>,
    state: BoardState,
    pending_delete: Option<String>,
    notices: Vec<String>,
}

impl BoardController {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            state: BoardState::default(),
            pending_delete: None,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Id of the task awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Take the accumulated user-visible failure notices.
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Reload the full task list from the server.
    pub async fn refresh(&mut self) -> bool {
        match self.api.list().await {
            Ok(tasks) => {
                self.state = BoardState::new(tasks);
                true
            }
            Err(e) => {
                self.notices.push(format!("Could not load tasks: {e}"));
                false
            }
        }
    }

    /// Create a task. The provisional local entry is swapped for the
    /// server's representation on success.
    pub async fn create_task(
        &mut self,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> bool {
        let title = title.trim();
        if title.chars().count() < MIN_TITLE_CHARS {
            self.notices
                .push(format!("Title must be at least {MIN_TITLE_CHARS} characters"));
            return false;
        }

        let provisional = Task {
            id: format!("pending-{}", uuid::Uuid::new_v4()),
            title: title.to_string(),
            description: description.trim().to_string(),
            status,
            owner_id: String::new(),
            created_at: Utc::now(),
        };
        let provisional_id = provisional.id.clone();
        let snapshot = self.state.clone();
        self.state = self.state.apply(&BoardAction::Create { task: provisional });

        let draft = TaskDraft {
            title: title.to_string(),
            description: description.trim().to_string(),
            status,
        };
        match self.api.create(&draft).await {
            Ok(task) => {
                self.state.replace(&provisional_id, task);
                true
            }
            Err(e) => {
                self.state = snapshot;
                self.notices.push(format!("Could not create task: {e}"));
                false
            }
        }
    }

    /// Edit a task's fields, reconciling with the server's representation.
    pub async fn edit_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        if let Some(title) = patch.title.as_deref() {
            if title.trim().chars().count() < MIN_TITLE_CHARS {
                self.notices
                    .push(format!("Title must be at least {MIN_TITLE_CHARS} characters"));
                return false;
            }
        }

        let snapshot = self.state.clone();
        self.state = self.state.apply(&BoardAction::Edit {
            id: id.to_string(),
            patch: patch.clone(),
        });

        match self.api.update(id, &patch).await {
            Ok(task) => {
                self.state.replace(id, task);
                true
            }
            Err(e) => {
                self.state = snapshot;
                self.notices.push(format!("Could not update task: {e}"));
                false
            }
        }
    }

    /// Move a task to another column (drag-and-drop). Already applied
    /// locally, so success leaves the state as-is.
    pub async fn move_task(&mut self, id: &str, status: TaskStatus) -> bool {
        let snapshot = self.state.clone();
        self.state = self.state.apply(&BoardAction::Move {
            id: id.to_string(),
            status,
        });

        let patch = TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        };
        match self.api.update(id, &patch).await {
            Ok(_) => true,
            Err(e) => {
                self.state = snapshot;
                self.notices.push(format!("Could not move task: {e}"));
                false
            }
        }
    }

    /// Stage a delete for confirmation. No state changes until
    /// [`Self::confirm_delete`].
    pub fn request_delete(&mut self, id: &str) {
        self.pending_delete = Some(id.to_string());
    }

    /// Drop a pending delete with no state change.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Carry out the staged delete optimistically.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.pending_delete.take() else {
            return false;
        };

        let snapshot = self.state.clone();
        self.state = self.state.apply(&BoardAction::Delete { id: id.clone() });

        match self.api.delete(&id).await {
            Ok(()) => true,
            Err(e) => {
                self.state = snapshot;
                self.notices.push(format!("Could not delete task: {e}"));
                false
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
