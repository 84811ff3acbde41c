//! User credential management.
//!
//! Provides:
//! - User registration with username/password (iterated SHA-256, 100k rounds + per-user salt)
//! - Credential verification with constant-time comparison
//! - SQLite-backed persistent storage
//!
//! ## Design decisions
//! - Unknown-username and wrong-password failures are the same error kind,
//!   and the unknown-username path performs a dummy hash, so neither the
//!   response nor its timing leaks which usernames exist.
//! - Username uniqueness is case-sensitive on the trimmed value; `Demo` and
//!   `demo` are distinct accounts.
//! - Session state lives in the token itself (see [`crate::token`]); this
//!   store holds only user records.

pub mod store;

pub use store::{AuthError, AuthStore, User};
