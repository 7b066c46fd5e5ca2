//! Domain model for user records.
//!
//! # Responsibility
//! - Define the record shapes passed between service, gateway and callers.
//! - Own the pure field validation rules.
//!
//! # Invariants
//! - A persisted `User` always carries a store-assigned id and `created_at`.
//! - Validation functions are pure and never touch storage.

pub mod user;
pub mod validation;
