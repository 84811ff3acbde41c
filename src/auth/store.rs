//! SQLite-backed credential store.
//!
//! One table: `users` (id, username, password_hash, salt, created_at).
//! Usernames are unique, case-sensitive, stored trimmed.

use parking_lot::Mutex;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Salt byte length for password hashing.
const SALT_BYTES: usize = 16;

/// Number of SHA-256 iterations for password stretching.
const HASH_ITERATIONS: u32 = 100_000;

/// A registered user. The password hash never leaves this module.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    DuplicateUsername,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("credential storage failed: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// SQLite-backed credential store.
pub struct AuthStore {
    conn: Mutex<rusqlite::Connection>,
}

impl AuthStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, AuthError> {
        let conn = rusqlite::Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Register a new user. The username is stored trimmed; a duplicate
    /// (exact, case-sensitive match) is rejected without altering the
    /// existing record.
    pub fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let trimmed = username.trim();
        let user_id = uuid::Uuid::new_v4().to_string();
        let salt = generate_salt();
        let password_hash = hash_password(password, &salt);
        let now = epoch_secs() as i64;

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (id, username, password_hash, salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![user_id, trimmed, password_hash, salt, now],
        );

        match result {
            Ok(_) => Ok(User {
                id: user_id,
                username: trimmed.to_string(),
                created_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AuthError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify a username/password pair. Unknown user and wrong password are
    /// indistinguishable to the caller.
    pub fn verify(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let trimmed = username.trim();
        let conn = self.conn.lock();
        let row: Result<(String, String, String, i64), _> = conn.query_row(
            "SELECT id, password_hash, salt, created_at FROM users WHERE username = ?1",
            rusqlite::params![trimmed],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        );

        match row {
            Ok((id, stored_hash, salt, created_at)) => {
                let attempt_hash = hash_password(password, &salt);
                if !constant_time_eq(stored_hash.as_bytes(), attempt_hash.as_bytes()) {
                    return Err(AuthError::InvalidCredentials);
                }
                Ok(User {
                    id,
                    username: trimmed.to_string(),
                    created_at,
                })
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                // Perform dummy hash to prevent timing side-channel
                let _ = hash_password(password, "0000000000000000");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by username (trimmed, exact match).
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT id, username, created_at FROM users WHERE username = ?1",
            rusqlite::params![username.trim()],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        );

        match row {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Count registered users.
    pub fn user_count(&self) -> Result<u64, AuthError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

// ── Cryptographic helpers ───────────────────────────────────────────

/// Generate a random salt (hex-encoded).
fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with salt using iterated SHA-256.
fn hash_password(password: &str, salt: &str) -> String {
    let mut hash = Sha256::new();
    hash.update(salt.as_bytes());
    hash.update(password.as_bytes());
    let mut result = hash.finalize();

    // Iterated hashing for key stretching
    for _ in 1..HASH_ITERATIONS {
        let mut h = Sha256::new();
        h.update(result);
        h.update(salt.as_bytes());
        result = h.finalize();
    }

    hex::encode(result)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ── Tests ───────────────────────────────────────────────────────────
