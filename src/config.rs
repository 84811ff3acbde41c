//! Process configuration from environment variables.
//!
//! Two settings are mandatory and checked before anything else starts:
//! the SQLite database path and the token signing secret. A missing
//! setting is fatal — the error names every absent variable so a broken
//! deployment fails loudly instead of serving unsigned tokens.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// SQLite database path (required).
pub const ENV_DB_PATH: &str = "TASKDECK_DB_PATH";
/// Token signing secret (required).
pub const ENV_TOKEN_SECRET: &str = "TASKDECK_TOKEN_SECRET";
/// Bind host (optional, defaults to loopback).
pub const ENV_HOST: &str = "TASKDECK_HOST";
/// Bind port (optional).
pub const ENV_PORT: &str = "TASKDECK_PORT";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5001;

/// Resolved startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub token_secret: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty());
        let token_secret = lookup(ENV_TOKEN_SECRET).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = [
            (ENV_DB_PATH, database_path.is_none()),
            (ENV_TOKEN_SECRET, token_secret.is_none()),
        ]
        .iter()
        .filter_map(|(name, absent)| absent.then_some(*name))
        .collect();

        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let host = lookup(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(ENV_PORT) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_path: PathBuf::from(database_path.unwrap_or_default()),
            token_secret: token_secret.unwrap_or_default(),
            host,
            port,
        })
    }
}
