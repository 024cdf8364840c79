//! User use-case service.
//!
//! # Responsibility
//! - Apply business rules (field bounds, email uniqueness) before writes.
//! - Expose read-only lookups and statistics to API callers.
//!
//! # Invariants
//! - Each write runs its existence/uniqueness checks and the mutation inside
//!   one repository transaction.
//! - The service holds no state besides its repository.
//! - Service logs carry ids and error codes only, never field values.

use crate::model::stats::{AgeStatistics, DomainStatistics};
use crate::model::user::{User, UserDraft, UserId, UserValidationError, UserValidationErrors};
use crate::repo::user_repo::{RepoError, UserRepository};
use chrono::{DateTime, TimeDelta, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, UserServiceError>;

/// Default look-back window of the recent-users projection.
pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Input violates one or more field rules.
    Validation(UserValidationErrors),
    /// Email already belongs to another user.
    DuplicateEmail(String),
    /// Target user does not exist.
    NotFound(UserId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl UserServiceError {
    /// Stable machine-readable code, safe to log.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::NotFound(_) => "user_not_found",
            Self::Repo(_) => "repo_failure",
        }
    }
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateEmail(email) => write!(f, "email already exists: {email}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::DuplicateEmail(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            RepoError::Validation(errors) => Self::Validation(errors),
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationErrors> for UserServiceError {
    fn from(value: UserValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// User service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns every violated field rule of `draft`; empty means valid.
    pub fn validate(&self, draft: &UserDraft) -> Vec<UserValidationError> {
        draft.validate()
    }

    /// Creates one user.
    ///
    /// # Errors
    /// - `Validation` with all violated rules.
    /// - `DuplicateEmail` when the email is taken; nothing is written.
    pub fn create_user(&self, draft: UserDraft) -> ServiceResult<User> {
        let result = draft.into_fields().map_err(UserServiceError::from).and_then(|fields| {
            self.repo.atomically(|repo| -> ServiceResult<User> {
                if repo.exists_by_email(&fields.email)? {
                    return Err(UserServiceError::DuplicateEmail(fields.email.clone()));
                }
                Ok(repo.save(None, &fields)?)
            })
        });

        match &result {
            Ok(user) => info!(
                "event=user_create module=service status=ok user_id={}",
                user.id
            ),
            Err(err) => warn!(
                "event=user_create module=service status=error error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Replaces all mutable fields of user `id`.
    ///
    /// The identifier and created timestamp are preserved; the updated
    /// timestamp is refreshed.
    ///
    /// # Errors
    /// - `Validation` with all violated rules.
    /// - `NotFound` when `id` does not exist; nothing is created.
    /// - `DuplicateEmail` when the new email belongs to another user.
    pub fn update_user(&self, id: UserId, draft: UserDraft) -> ServiceResult<User> {
        let result = draft.into_fields().map_err(UserServiceError::from).and_then(|fields| {
            self.repo.atomically(|repo| -> ServiceResult<User> {
                let existing = repo
                    .find_by_id(id)?
                    .ok_or(UserServiceError::NotFound(id))?;
                if existing.email != fields.email && repo.exists_by_email(&fields.email)? {
                    return Err(UserServiceError::DuplicateEmail(fields.email.clone()));
                }
                Ok(repo.save(Some(id), &fields)?)
            })
        });

        match &result {
            Ok(user) => info!(
                "event=user_update module=service status=ok user_id={}",
                user.id
            ),
            Err(err) => warn!(
                "event=user_update module=service status=error user_id={} error_code={}",
                id,
                err.code()
            ),
        }
        result
    }

    /// Deletes user `id`.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    pub fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        let result = self
            .repo
            .atomically(|repo| repo.delete_by_id(id).map_err(UserServiceError::from));

        match &result {
            Ok(()) => info!("event=user_delete module=service status=ok user_id={id}"),
            Err(err) => warn!(
                "event=user_delete module=service status=error user_id={} error_code={}",
                id,
                err.code()
            ),
        }
        result
    }

    pub fn get_all_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_all()?)
    }

    pub fn get_user_by_id(&self, id: UserId) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_by_id(id)?)
    }

    pub fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_by_email(email)?)
    }

    /// Case-sensitive substring match on name.
    pub fn search_users_by_name(&self, fragment: &str) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_name_containing(fragment)?)
    }

    pub fn search_users_by_name_ignore_case(&self, fragment: &str) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_name_containing_ignore_case(fragment)?)
    }

    /// Inclusive age range; an inverted range yields no users.
    pub fn search_users_by_age_range(&self, min: i64, max: i64) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_age_between(min, max)?)
    }

    pub fn get_adult_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_adults()?)
    }

    pub fn get_users_by_min_age(&self, age: i64) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_age_greater_or_equal(age)?)
    }

    /// Users whose email ends with `@{domain}`.
    pub fn get_users_by_email_domain(&self, domain: &str) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_email_ending_with(&format!("@{domain}"))?)
    }

    pub fn get_users_with_phone_number(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_has_phone_number()?)
    }

    pub fn get_users_sorted_by_age(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_ordered_by_age_ascending()?)
    }

    pub fn get_users_sorted_by_name_desc(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_ordered_by_name_descending()?)
    }

    pub fn get_users_by_name_and_age(&self, name: &str, age: i64) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_name_and_age(name, age)?)
    }

    pub fn get_users_by_name_or_email(&self, name: &str, email: &str) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_by_name_or_email(name, email)?)
    }

    pub fn get_age_statistics(&self) -> ServiceResult<AgeStatistics> {
        Ok(self.repo.count_by_age_bracket()?)
    }

    pub fn get_domain_statistics(&self) -> ServiceResult<DomainStatistics> {
        Ok(self.repo.count_by_email_domain()?)
    }

    /// Users created within the last `days` days of now.
    pub fn get_recent_users(&self, days: u32) -> ServiceResult<Vec<User>> {
        self.get_users_created_within(days, Utc::now())
    }

    /// Users created at or after `now - days`.
    pub fn get_users_created_within(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<User>> {
        let cutoff = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self.repo.find_created_since(cutoff)?)
    }

    pub fn get_total_user_count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }

    pub fn get_user_count_by_name(&self, name: &str) -> ServiceResult<u64> {
        Ok(self.repo.count_by_name(name)?)
    }

    pub fn is_email_exists(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.repo.exists_by_email(email)?)
    }

    /// One-line description of `user`.
    pub fn user_summary(&self, user: &User) -> String {
        user.summary()
    }
}
