//! SQLite-backed task store.
//!
//! One table: `tasks` (id, owner_id, title, description, status,
//! created_at). All operations are filtered by `owner_id`; "not yours" and
//! "does not exist" are one indistinguishable [`TaskStoreError::NotFound`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::Done => "done",
        }
    }

    /// Strict parse; `None` for anything outside the three columns.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "inprogress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Lenient parse; unknown values coerce to the default column.
    pub fn from_str_lossy(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Todo)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}

/// A task as stored and as serialized on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new task; used by create, seed, and the client API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
}

/// Partial update. Only supplied fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("task not found")]
    NotFound,
    #[error("task storage failed: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// SQLite-backed task store.
pub struct TaskStore {
    conn: Mutex<rusqlite::Connection>,
}

impl TaskStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, TaskStoreError> {
        let conn = rusqlite::Connection::open(db_path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'todo',
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All tasks owned by `owner_id`, in store-native order.
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>, TaskStoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, description, status, created_at
             FROM tasks WHERE owner_id = ?1",
        )?;
        let tasks = stmt
            .query_map(rusqlite::params![owner_id], row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Insert a new task for `owner_id`. Title and description are stored
    /// trimmed.
    pub fn create(
        &self,
        owner_id: &str,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<Task, TaskStoreError> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            status,
            owner_id: owner_id.to_string(),
            created_at: now_secs(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (id, owner_id, title, description, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                task.id,
                task.owner_id,
                task.title,
                task.description,
                task.status.as_str(),
                task.created_at.timestamp(),
            ],
        )?;
        Ok(task)
    }

    /// Apply a partial update to an owner's task and return the new
    /// representation. Unknown id and cross-owner id both yield
    /// [`TaskStoreError::NotFound`].
    pub fn update(
        &self,
        id: &str,
        owner_id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, TaskStoreError> {
        let conn = self.conn.lock();
        let mut task = conn
            .query_row(
                "SELECT id, owner_id, title, description, status, created_at
                 FROM tasks WHERE id = ?1 AND owner_id = ?2",
                rusqlite::params![id, owner_id],
                row_to_task,
            )
            .map_err(not_found_on_no_rows)?;

        if let Some(title) = &patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }

        conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, status = ?3
             WHERE id = ?4 AND owner_id = ?5",
            rusqlite::params![
                task.title,
                task.description,
                task.status.as_str(),
                id,
                owner_id
            ],
        )?;
        Ok(task)
    }

    /// Delete an owner's task. Same not-found semantics as [`Self::update`].
    pub fn delete(&self, id: &str, owner_id: &str) -> Result<(), TaskStoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            rusqlite::params![id, owner_id],
        )?;
        if deleted == 0 {
            return Err(TaskStoreError::NotFound);
        }
        Ok(())
    }

    /// Replace the owner's entire task set with the given drafts. Used by
    /// the seed operation.
    pub fn replace_owner_tasks(
        &self,
        owner_id: &str,
        drafts: &[TaskDraft],
    ) -> Result<Vec<Task>, TaskStoreError> {
        let now = now_secs();
        let mut inserted = Vec::with_capacity(drafts.len());

        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM tasks WHERE owner_id = ?1",
            rusqlite::params![owner_id],
        )?;
        for draft in drafts {
            let task = Task {
                id: uuid::Uuid::new_v4().to_string(),
                title: draft.title.trim().to_string(),
                description: draft.description.trim().to_string(),
                status: draft.status,
                owner_id: owner_id.to_string(),
                created_at: now,
            };
            conn.execute(
                "INSERT INTO tasks (id, owner_id, title, description, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    task.id,
                    task.owner_id,
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.created_at.timestamp(),
                ],
            )?;
            inserted.push(task);
        }
        Ok(inserted)
    }
}

/// Current time truncated to whole seconds — the precision the `created_at`
/// column stores. Returned tasks must match what a later read yields.
fn now_secs() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_default()
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    let created_secs: i64 = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from_str_lossy(&status),
        created_at: DateTime::from_timestamp(created_secs, 0).unwrap_or_default(),
    })
}

fn not_found_on_no_rows(e: rusqlite::Error) -> TaskStoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => TaskStoreError::NotFound,
        other => TaskStoreError::Storage(other),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
