//! User record model.
//!
//! # Responsibility
//! - Separate unsaved input (`NewUser`) from persisted rows (`User`).
//! - Carry partial update input (`UserPatch`) with explicit per-field absence.
//!
//! # Invariants
//! - `User::id` is assigned by the store and never reused.
//! - `User::created_at` is set once on insert and never modified.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned surrogate key.
pub type UserId = i64;

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    /// Unix epoch milliseconds, assigned by the store at insert time.
    pub created_at: i64,
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User{{id={}, name={}, email={}, age=", self.id, self.name, self.email)?;
        match self.age {
            Some(age) => write!(f, "{age}")?,
            None => f.write_str("-")?,
        }
        write!(f, ", created_at={}}}", self.created_at)
    }
}

/// Unsaved user record built from caller input.
///
/// Becomes a `User` only through a successful gateway `save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

impl NewUser {
    /// Creates an unsaved record. Does not validate.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: Option<i32>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }
}

/// Partial update input.
///
/// `None` leaves the field untouched. For `name` and `email`, a value that
/// is blank after trim is treated the same as `None`. For `age`, any
/// `Some` (including `Some(0)`) counts as provided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
}

impl UserPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    /// Trimmed name when provided, `None` when absent or blank.
    pub fn provided_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Trimmed email when provided, `None` when absent or blank.
    pub fn provided_email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Returns whether no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.provided_name().is_none() && self.provided_email().is_none() && self.age.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{User, UserPatch};

    #[test]
    fn blank_patch_fields_count_as_absent() {
        let patch = UserPatch::default().name("   ").email("");
        assert!(patch.provided_name().is_none());
        assert!(patch.provided_email().is_none());
        assert!(patch.is_empty());
    }

    #[test]
    fn zero_age_counts_as_provided() {
        let patch = UserPatch::default().age(0);
        assert!(!patch.is_empty());
    }

    #[test]
    fn provided_values_are_trimmed() {
        let patch = UserPatch::default().name("  Anna  ").email(" anna@x.com ");
        assert_eq!(patch.provided_name(), Some("Anna"));
        assert_eq!(patch.provided_email(), Some("anna@x.com"));
    }

    #[test]
    fn display_renders_missing_age_as_dash() {
        let user = User {
            id: 7,
            name: "Anna".to_string(),
            email: "anna@x.com".to_string(),
            age: None,
            created_at: 1_000,
        };
        assert_eq!(
            user.to_string(),
            "User{id=7, name=Anna, email=anna@x.com, age=-, created_at=1000}"
        );
    }
}
