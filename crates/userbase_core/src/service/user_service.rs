//! User record use-case service.
//!
//! # Responsibility
//! - Validate caller input before any storage access.
//! - Enforce email uniqueness ahead of writes.
//! - Apply partial-update semantics.
//! - Map gateway failures into the four-kind `UserServiceError` taxonomy.
//!
//! # Invariants
//! - Each operation performs at most one gateway transaction.
//! - `Invalid`, `NotFound` and `AlreadyExists` are never wrapped.
//! - Gateway error types never reach callers except as the `StorageFailure`
//!   cause.
//! - An update with no provided field performs no write.

use crate::model::user::{NewUser, User, UserId, UserPatch};
use crate::model::validation::{
    validate_age, validate_email, validate_name, validate_user_id, ValidationError,
};
use crate::repo::user_repo::{RepoError, UserRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lookup key reported with `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(UserId),
    Email(String),
}

impl Display for UserKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Email(email) => write!(f, "email {email}"),
        }
    }
}

/// Fieldless mirror of `UserServiceError` for callers that only branch on
/// the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserErrorKind {
    Invalid,
    NotFound,
    AlreadyExists,
    StorageFailure,
}

/// Errors from user service operations.
#[derive(Debug)]
pub enum UserServiceError {
    /// A field or argument failed validation.
    Invalid(ValidationError),
    /// No record matches the key.
    NotFound(UserKey),
    /// Another record already uses this email.
    AlreadyExists(String),
    /// Any other gateway failure. The cause is kept for diagnostics.
    StorageFailure(RepoError),
}

impl UserServiceError {
    pub fn kind(&self) -> UserErrorKind {
        match self {
            Self::Invalid(_) => UserErrorKind::Invalid,
            Self::NotFound(_) => UserErrorKind::NotFound,
            Self::AlreadyExists(_) => UserErrorKind::AlreadyExists,
            Self::StorageFailure(_) => UserErrorKind::StorageFailure,
        }
    }
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "invalid {}: {err}", err.field()),
            Self::NotFound(key) => write!(f, "user not found: {key}"),
            Self::AlreadyExists(email) => write!(f, "user with email {email} already exists"),
            Self::StorageFailure(_) => write!(f, "storage failure"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::StorageFailure(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) => None,
        }
    }
}

impl From<ValidationError> for UserServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            // A concurrent writer claimed the email between pre-check and write.
            RepoError::Conflict { email } => Self::AlreadyExists(email),
            other => Self::StorageFailure(other),
        }
    }
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Record service facade over a user repository.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates input, checks email uniqueness, then persists a new user.
    ///
    /// # Contract
    /// - Name and email are stored trimmed.
    /// - Returns the stored record with `id` and `created_at` populated.
    /// - Returns `AlreadyExists` without writing when the email is taken.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        age: Option<i32>,
    ) -> UserServiceResult<User> {
        validate_name(name)?;
        validate_email(email)?;
        validate_age(age)?;

        let email = email.trim();
        if self.repo.exists_by_email(email)? {
            warn!("event=user_create module=service status=rejected reason=email_taken");
            return Err(UserServiceError::AlreadyExists(email.to_string()));
        }

        let user = self.repo.save(&NewUser::new(name.trim(), email, age))?;
        info!("event=user_create module=service status=ok id={}", user.id);
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: UserId) -> UserServiceResult<User> {
        validate_user_id(id)?;
        self.repo
            .find_by_id(id)?
            .ok_or(UserServiceError::NotFound(UserKey::Id(id)))
    }

    /// Looks up by trimmed, case-sensitive email.
    pub fn get_user_by_email(&self, email: &str) -> UserServiceResult<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmailBlank.into());
        }

        self.repo
            .find_by_email(email)?
            .ok_or_else(|| UserServiceError::NotFound(UserKey::Email(email.to_string())))
    }

    pub fn get_all_users(&self) -> UserServiceResult<Vec<User>> {
        Ok(self.repo.find_all()?)
    }

    /// Applies a partial update to an existing user.
    ///
    /// # Contract
    /// - Only provided fields are validated and changed (see `UserPatch`).
    /// - A new email that differs from the current one must be unused.
    /// - An empty patch returns the current record without writing.
    pub fn update_user(&self, id: UserId, patch: &UserPatch) -> UserServiceResult<User> {
        validate_user_id(id)?;
        let mut user = self
            .repo
            .find_by_id(id)?
            .ok_or(UserServiceError::NotFound(UserKey::Id(id)))?;

        if patch.is_empty() {
            info!("event=user_update module=service status=noop id={id}");
            return Ok(user);
        }

        if let Some(name) = patch.provided_name() {
            validate_name(name)?;
            user.name = name.to_string();
        }

        if let Some(email) = patch.provided_email() {
            validate_email(email)?;
            if email != user.email && self.repo.exists_by_email(email)? {
                warn!("event=user_update module=service status=rejected id={id} reason=email_taken");
                return Err(UserServiceError::AlreadyExists(email.to_string()));
            }
            user.email = email.to_string();
        }

        if let Some(age) = patch.age {
            validate_age(Some(age))?;
            user.age = Some(age);
        }

        self.repo.update(&user)?;
        info!("event=user_update module=service status=ok id={id}");
        Ok(user)
    }

    pub fn delete_user(&self, id: UserId) -> UserServiceResult<()> {
        validate_user_id(id)?;
        if !self.repo.delete(id)? {
            return Err(UserServiceError::NotFound(UserKey::Id(id)));
        }

        info!("event=user_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Storage failures propagate as `StorageFailure`; there is no fallback
    /// to zero.
    pub fn get_user_count(&self) -> UserServiceResult<u64> {
        Ok(self.repo.count()?)
    }

    /// Removes every user. Callers are responsible for confirming intent.
    pub fn delete_all_users(&self) -> UserServiceResult<()> {
        let removed = self.repo.delete_all()?;
        warn!("event=user_delete_all module=service status=ok removed={removed}");
        Ok(())
    }
}
