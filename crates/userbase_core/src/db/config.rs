//! Store configuration.
//!
//! # Responsibility
//! - Describe where the store lives and how long writers wait on locks.
//! - Load that description from the process environment.
//!
//! # Invariants
//! - Misconfiguration is reported as `DbError::InvalidConfig` before any
//!   connection is opened.

use super::{DbError, DbResult};
use std::path::PathBuf;
use std::time::Duration;

/// Path of the SQLite file, or `:memory:` for a private in-memory store.
pub const DB_PATH_ENV: &str = "USERBASE_DB_PATH";
/// Lock wait in milliseconds for concurrent writers.
pub const DB_BUSY_TIMEOUT_ENV: &str = "USERBASE_DB_BUSY_TIMEOUT_MS";

const MEMORY_PATH: &str = ":memory:";
const DEFAULT_DB_FILE_NAME: &str = "userbase.sqlite3";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Loads configuration from `USERBASE_DB_PATH` and
    /// `USERBASE_DB_BUSY_TIMEOUT_MS`.
    ///
    /// An unset path falls back to `userbase.sqlite3` in the working
    /// directory; an unset timeout falls back to five seconds.
    ///
    /// # Errors
    /// - Path is set but blank.
    /// - Timeout is set but not a non-negative integer.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let location = match lookup(DB_PATH_ENV) {
            None => StoreLocation::File(PathBuf::from(DEFAULT_DB_FILE_NAME)),
            Some(raw) => parse_location(&raw)?,
        };

        let busy_timeout = match lookup(DB_BUSY_TIMEOUT_ENV) {
            None => DEFAULT_BUSY_TIMEOUT,
            Some(raw) => parse_busy_timeout(&raw)?,
        };

        Ok(Self {
            location,
            busy_timeout,
        })
    }

    /// Short label used in log events.
    pub(crate) fn mode(&self) -> &'static str {
        match self.location {
            StoreLocation::File(_) => "file",
            StoreLocation::Memory => "memory",
        }
    }
}

fn parse_location(raw: &str) -> DbResult<StoreLocation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbError::InvalidConfig(format!(
            "{DB_PATH_ENV} cannot be empty"
        )));
    }
    if trimmed == MEMORY_PATH {
        return Ok(StoreLocation::Memory);
    }
    Ok(StoreLocation::File(PathBuf::from(trimmed)))
}

fn parse_busy_timeout(raw: &str) -> DbResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|err| {
            DbError::InvalidConfig(format!(
                "{DB_BUSY_TIMEOUT_ENV} must be a whole number of milliseconds, got `{raw}`: {err}"
            ))
        })
}
