//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and repository calls into use-case level APIs.
//! - Keep front-end callers decoupled from storage details and error types.

pub mod user_service;
