//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `users` table.
//! - Assign `id` and `created_at` at insert time.
//! - Translate SQLite failures into `RepoError`.
//!
//! # Invariants
//! - `save`, `update`, `delete` and `delete_all` each run in one IMMEDIATE
//!   transaction; a failed mutation is rolled back before the error returns.
//! - `created_at` is never written after insert.
//! - `created_at` never decreases with insertion order, including across
//!   deletes: the highest value ever assigned is kept in `user_clock` and
//!   advanced in the same transaction as the insert.

use crate::db::{DbError, Store};
use crate::model::user::{NewUser, User, UserId};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, Params, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    age,
    created_at
FROM users";

// Wall clock in epoch milliseconds, clamped to the highest value ever
// assigned.
const USER_INSERT_SQL: &str = "INSERT INTO users (name, email, age, created_at)
VALUES (
    ?1,
    ?2,
    ?3,
    max(
        CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER),
        COALESCE((SELECT last_created_at FROM user_clock WHERE id = 1), 0)
    )
);";

const ADVANCE_CLOCK_SQL: &str = "INSERT INTO user_clock (id, last_created_at)
VALUES (1, ?1)
ON CONFLICT (id) DO UPDATE SET last_created_at = max(last_created_at, excluded.last_created_at);";

pub type RepoResult<T> = Result<T, RepoError>;

/// Gateway error for user persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Another row already holds this email.
    Conflict { email: String },
    /// Any other storage-level failure, including a closed store.
    StoreUnavailable(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict { email } => write!(f, "email already stored: {email}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::Conflict { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::StoreUnavailable(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StoreUnavailable(DbError::Sqlite(value))
    }
}

/// Repository interface for user CRUD operations.
///
/// Implementations hold no per-call state and must be usable from several
/// threads when the implementing type is `Sync`.
pub trait UserRepository {
    /// Inserts a new row and returns it with `id` and `created_at` assigned.
    fn save(&self, user: &NewUser) -> RepoResult<User>;
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Exact, case-sensitive match.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    /// All rows in insertion order. Empty when the table is empty.
    fn find_all(&self) -> RepoResult<Vec<User>>;
    /// Writes every mutable field of an existing row.
    ///
    /// Does not report missing rows; callers confirm existence first.
    fn update(&self, user: &User) -> RepoResult<()>;
    /// Returns `false` when no row had this id.
    fn delete(&self, id: UserId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
    /// Removes every row and returns how many were removed.
    fn delete_all(&self) -> RepoResult<u64>;
}

impl<R: UserRepository + ?Sized> UserRepository for &R {
    fn save(&self, user: &NewUser) -> RepoResult<User> {
        (**self).save(user)
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        (**self).find_by_email(email)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        (**self).exists_by_email(email)
    }

    fn find_all(&self) -> RepoResult<Vec<User>> {
        (**self).find_all()
    }

    fn update(&self, user: &User) -> RepoResult<()> {
        (**self).update(user)
    }

    fn delete(&self, id: UserId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }

    fn delete_all(&self) -> RepoResult<u64> {
        (**self).delete_all()
    }
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'store> {
    store: &'store Store,
}

impl<'store> SqliteUserRepository<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }

    /// Runs `mutate` inside one IMMEDIATE transaction.
    ///
    /// Commits on `Ok`, rolls back on `Err` and logs the rollback.
    fn write<T>(
        &self,
        op: &'static str,
        mutate: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.store.with_connection(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            match mutate(&tx) {
                Ok(value) => {
                    tx.commit()?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback() {
                        error!(
                            "event=user_write module=repo op={op} status=error error_code=rollback_failed error={rollback_err}"
                        );
                    }
                    warn!("event=user_write module=repo op={op} status=rollback error={err}");
                    Err(err)
                }
            }
        })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn save(&self, user: &NewUser) -> RepoResult<User> {
        let saved = self.write("save", |tx| {
            tx.execute(
                USER_INSERT_SQL,
                params![user.name.as_str(), user.email.as_str(), user.age],
            )
            .map_err(|err| classify_write_error(err, user.email.as_str()))?;

            let id = tx.last_insert_rowid();
            let saved = select_one(tx, "WHERE id = ?1", [id])?.ok_or_else(|| {
                RepoError::InvalidData(format!("inserted row {id} missing on read-back"))
            })?;
            tx.execute(ADVANCE_CLOCK_SQL, [saved.created_at])?;
            Ok(saved)
        })?;

        info!("event=user_save module=repo status=ok id={}", saved.id);
        Ok(saved)
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.store
            .with_connection(|conn| select_one(conn, "WHERE id = ?1", [id]))
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.store
            .with_connection(|conn| select_one(conn, "WHERE email = ?1", [email]))
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        self.store.with_connection(|conn| {
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1);",
                [email],
                |row| row.get(0),
            )?;
            Ok(exists == 1)
        })
    }

    fn find_all(&self) -> RepoResult<Vec<User>> {
        self.store.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(parse_user_row(row)?);
            }
            debug!("event=user_find_all module=repo status=ok count={}", users.len());
            Ok(users)
        })
    }

    fn update(&self, user: &User) -> RepoResult<()> {
        let changed = self.write("update", |tx| {
            tx.execute(
                "UPDATE users
                 SET
                    name = ?1,
                    email = ?2,
                    age = ?3
                 WHERE id = ?4;",
                params![user.name.as_str(), user.email.as_str(), user.age, user.id],
            )
            .map_err(|err| classify_write_error(err, user.email.as_str()))
        })?;

        if changed == 0 {
            warn!(
                "event=user_update module=repo status=noop id={} reason=row_missing",
                user.id
            );
        } else {
            info!("event=user_update module=repo status=ok id={}", user.id);
        }
        Ok(())
    }

    fn delete(&self, id: UserId) -> RepoResult<bool> {
        let changed = self.write("delete", |tx| {
            Ok(tx.execute("DELETE FROM users WHERE id = ?1;", [id])?)
        })?;

        let removed = changed > 0;
        info!("event=user_delete module=repo status=ok id={id} removed={removed}");
        Ok(removed)
    }

    fn count(&self) -> RepoResult<u64> {
        let result = self.store.with_connection(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
            u64::try_from(total)
                .map_err(|_| RepoError::InvalidData(format!("negative row count {total}")))
        });

        if let Err(err) = &result {
            error!("event=user_count module=repo status=error error={err}");
        }
        result
    }

    fn delete_all(&self) -> RepoResult<u64> {
        let removed = self.write("delete_all", |tx| {
            Ok(tx.execute("DELETE FROM users;", [])?)
        })?;

        warn!("event=user_delete_all module=repo status=ok removed={removed}");
        Ok(removed as u64)
    }
}

fn select_one<P: Params>(conn: &Connection, filter: &str, params: P) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} {filter};"))?;
    let mut rows = stmt.query(params)?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: UserId = row.get("id")?;
    if id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid id value `{id}` in users.id"
        )));
    }

    Ok(User {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        age: row.get("age")?,
        created_at: row.get("created_at")?,
    })
}

fn classify_write_error(err: rusqlite::Error, email: &str) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Conflict {
            email: email.to_string(),
        };
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
