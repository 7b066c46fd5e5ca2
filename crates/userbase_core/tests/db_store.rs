use rusqlite::Connection;
use userbase_core::db::migrations::{current_user_version, latest_version};
use userbase_core::{
    DbError, NewUser, SqliteUserRepository, Store, StoreConfig, UserRepository,
};

#[test]
fn open_in_memory_applies_latest_schema() {
    let store = Store::open_in_memory().unwrap();
    let (version, has_users) = store
        .with_connection(|conn| -> Result<(u32, bool), DbError> {
            let version = current_user_version(conn)?;
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'users');",
                [],
                |row| row.get(0),
            )?;
            Ok((version, exists == 1))
        })
        .unwrap();

    assert_eq!(version, latest_version());
    assert!(has_users);
}

#[test]
fn reopening_a_file_keeps_rows_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.sqlite3");
    let config = StoreConfig::file(&path);

    let store = Store::open(&config).unwrap();
    SqliteUserRepository::new(&store)
        .save(&NewUser::new("Anna", "anna@x.com", Some(28)))
        .unwrap();
    store.close().unwrap();

    let reopened = Store::open(&config).unwrap();
    let repo = SqliteUserRepository::new(&reopened);
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.exists_by_email("anna@x.com").unwrap());
}

#[test]
fn open_rejects_newer_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
        .unwrap();
    drop(conn);

    let result = Store::open(&StoreConfig::file(&path));
    assert!(matches!(
        result,
        Err(DbError::UnsupportedSchemaVersion { db_version, latest_supported })
            if db_version == latest_version() + 1 && latest_supported == latest_version()
    ));
}

#[test]
fn open_fails_fast_on_unreachable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("users.sqlite3");

    let result = Store::open(&StoreConfig::file(path));
    assert!(matches!(result, Err(DbError::Sqlite(_))));
}

#[test]
fn close_is_idempotent_and_blocks_further_use() {
    let store = Store::open_in_memory().unwrap();
    store.close().unwrap();
    store.close().unwrap();
    assert!(!store.is_open());

    let err = SqliteUserRepository::new(&store).count().unwrap_err();
    assert!(err.to_string().contains("store is closed"));
}
