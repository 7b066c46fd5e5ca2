//! Persistence gateway for user records.
//!
//! # Responsibility
//! - Define the data access contract consumed by the record service.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every write runs in exactly one transaction and rolls back on failure.
//! - Missing rows are reported as `None`/`false`, never as errors.
//! - Unique-constraint violations on email are reported as `Conflict`.

pub mod user_repo;
