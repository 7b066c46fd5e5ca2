//! Field validation rules for user records.
//!
//! # Responsibility
//! - Reject malformed name/email/age/id values before any storage access.
//!
//! # Invariants
//! - Rules are pure: no I/O, no shared state beyond the compiled pattern.
//! - Lengths are measured in characters after trimming surrounding whitespace.
//! - Email uniqueness is not checked here; it needs a store lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 150;
pub const AGE_MIN: i32 = 0;
pub const AGE_MAX: i32 = 110;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Reason a field value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NameBlank,
    NameTooShort { chars: usize },
    NameTooLong { chars: usize },
    EmailBlank,
    EmailMalformed,
    EmailTooLong { chars: usize },
    AgeOutOfRange(i32),
    /// Ids are store-assigned and strictly positive.
    NonPositiveId(i64),
}

impl ValidationError {
    /// Name of the rejected field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameBlank | Self::NameTooShort { .. } | Self::NameTooLong { .. } => "name",
            Self::EmailBlank | Self::EmailMalformed | Self::EmailTooLong { .. } => "email",
            Self::AgeOutOfRange(_) => "age",
            Self::NonPositiveId(_) => "id",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameBlank => write!(f, "name must not be blank"),
            Self::NameTooShort { chars } => write!(
                f,
                "name must be at least {NAME_MIN_CHARS} characters, got {chars}"
            ),
            Self::NameTooLong { chars } => write!(
                f,
                "name must be at most {NAME_MAX_CHARS} characters, got {chars}"
            ),
            Self::EmailBlank => write!(f, "email must not be blank"),
            Self::EmailMalformed => write!(f, "email is not a valid address"),
            Self::EmailTooLong { chars } => write!(
                f,
                "email must be at most {EMAIL_MAX_CHARS} characters, got {chars}"
            ),
            Self::AgeOutOfRange(age) => {
                write!(f, "age must be between {AGE_MIN} and {AGE_MAX}, got {age}")
            }
            Self::NonPositiveId(id) => write!(f, "user id must be positive, got {id}"),
        }
    }
}

impl Error for ValidationError {}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameBlank);
    }

    let chars = trimmed.chars().count();
    if chars < NAME_MIN_CHARS {
        return Err(ValidationError::NameTooShort { chars });
    }
    if chars > NAME_MAX_CHARS {
        return Err(ValidationError::NameTooLong { chars });
    }
    Ok(())
}

/// Checks blank, then pattern, then length.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmailBlank);
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::EmailMalformed);
    }

    let chars = trimmed.chars().count();
    if chars > EMAIL_MAX_CHARS {
        return Err(ValidationError::EmailTooLong { chars });
    }
    Ok(())
}

/// Absent age is always accepted.
pub fn validate_age(age: Option<i32>) -> Result<(), ValidationError> {
    match age {
        Some(value) if !(AGE_MIN..=AGE_MAX).contains(&value) => {
            Err(ValidationError::AgeOutOfRange(value))
        }
        _ => Ok(()),
    }
}

pub fn validate_user_id(id: i64) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::NonPositiveId(id));
    }
    Ok(())
}
