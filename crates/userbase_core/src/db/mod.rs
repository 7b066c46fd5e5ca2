//! SQLite store bootstrap, configuration and schema migration entry points.
//!
//! # Responsibility
//! - Build the explicit store handle shared by the gateway.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No user data is read or written before migrations succeed.
//! - A closed store rejects every further acquisition.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
pub mod migrations;
mod store;

pub use config::{StoreConfig, StoreLocation, DB_BUSY_TIMEOUT_ENV, DB_PATH_ENV};
pub use store::Store;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Store configuration is unusable; raised before any connection is opened.
    InvalidConfig(String),
    /// The store was shut down with `Store::close`.
    Closed,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidConfig(message) => write!(f, "invalid store configuration: {message}"),
            Self::Closed => write!(f, "store is closed"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidConfig(_) | Self::Closed => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
