//! Explicit store handle over one SQLite connection.
//!
//! # Responsibility
//! - Open and configure the connection, then run migrations, before handing
//!   the store to callers.
//! - Lend the connection to one operation at a time.
//! - Shut the connection down on request.
//!
//! # Invariants
//! - A `Store` that exists has `foreign_keys=ON` and migrations applied.
//! - Operations never keep the connection beyond the closure they run in.
//! - After `close`, every operation fails with `DbError::Closed`.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, StoreConfig, StoreLocation};
use log::{error, info, warn};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared store handle.
///
/// Constructed once during process bootstrap and passed by reference to the
/// gateway. `Store` is `Send + Sync`; concurrent callers are serialized on
/// the underlying connection.
pub struct Store {
    conn: Mutex<Option<Connection>>,
    mode: &'static str,
}

impl Store {
    /// Opens the configured store and applies all pending migrations.
    ///
    /// # Side effects
    /// - Creates the database file when it does not exist yet.
    /// - Emits `db_open` logging events with duration and status.
    ///
    /// # Errors
    /// - The file cannot be opened, pragmas fail, or a migration fails.
    /// - The file carries a schema version newer than this binary supports.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        let mode = config.mode();
        info!("event=db_open module=db status=start mode={mode}");

        let opened = match &config.location {
            StoreLocation::File(path) => Connection::open(path),
            StoreLocation::Memory => Connection::open_in_memory(),
        };
        let mut conn = match opened {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        match bootstrap_connection(&mut conn, config.busy_timeout) {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(Some(conn)),
                    mode,
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Opens a private in-memory store. Data is lost on close.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(&StoreConfig::memory())
    }

    /// Runs `op` with exclusive access to the connection.
    ///
    /// The connection is released as soon as `op` returns.
    pub fn with_connection<T, E>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(conn) => op(conn),
            None => Err(DbError::Closed.into()),
        }
    }

    /// Returns whether `close` has not been called yet.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Closes the connection. Calling it again is a no-op.
    ///
    /// # Errors
    /// - SQLite refuses to close the connection; it is dropped regardless.
    pub fn close(&self) -> DbResult<()> {
        let Some(conn) = self.lock().take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok mode={}", self.mode);
                Ok(())
            }
            Err((_conn, err)) => {
                warn!(
                    "event=db_close module=db status=error mode={} error={}",
                    self.mode, err
                );
                Err(err.into())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        // A panic inside one operation leaves no half-applied state behind:
        // open transactions roll back when dropped.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::db::DbError;

    #[test]
    fn store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store>();
    }

    #[test]
    fn closed_store_rejects_operations() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.is_open());

        store.close().unwrap();
        store.close().unwrap();
        assert!(!store.is_open());

        let result: Result<(), DbError> = store.with_connection(|_| Ok(()));
        assert!(matches!(result, Err(DbError::Closed)));
    }
}
