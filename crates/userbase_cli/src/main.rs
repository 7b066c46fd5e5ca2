//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store, report the record count, and close it.
//! - Exercise configuration, logging and shutdown wiring outside a front end.
//!
//! Configuration is read from `USERBASE_DB_PATH`,
//! `USERBASE_DB_BUSY_TIMEOUT_MS`, `USERBASE_LOG_LEVEL` and `USERBASE_LOG_DIR`.
//! Logging stays off when `USERBASE_LOG_DIR` is unset.

use log::{error, info};
use std::process::ExitCode;
use userbase_core::logging::{LOG_DIR_ENV, LOG_LEVEL_ENV};
use userbase_core::{
    core_version, default_log_level, init_logging, SqliteUserRepository, Store, StoreConfig,
    UserService,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("userbase: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level =
            std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
        info!(
            "event=cli_start module=cli status=ok version={}",
            core_version()
        );
    }

    let config = StoreConfig::from_env().map_err(|err| err.to_string())?;
    let store = Store::open(&config).map_err(|err| format!("failed to open store: {err}"))?;

    let service = UserService::new(SqliteUserRepository::new(&store));
    let counted = service.get_user_count();
    match &counted {
        Ok(count) => info!("event=cli_count module=cli status=ok count={count}"),
        Err(err) => error!(
            "event=cli_count module=cli status=error error_code={:?}",
            err.kind()
        ),
    }

    store
        .close()
        .map_err(|err| format!("failed to close store: {err}"))?;

    let count = counted.map_err(|err| format!("{err} ({})", error_cause(&err)))?;
    println!("userbase_core version={}", core_version());
    println!("userbase users={count}");
    Ok(())
}

fn error_cause(err: &dyn std::error::Error) -> String {
    err.source()
        .map_or_else(|| "no cause".to_string(), ToString::to_string)
}
