//! User domain model.
//!
//! # Responsibility
//! - Define the persisted `User` record returned by every read path.
//! - Define `UserDraft` (raw caller input) and `UserFields` (validated input).
//! - Own the field rules used by both the service and the repository.
//!
//! # Invariants
//! - `id` is assigned by the store exactly once and never reused.
//! - `created_at <= updated_at` for every persisted record.
//! - Validation reports every violated rule, never only the first one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned user identifier (`users.id`).
pub type UserId = i64;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const AGE_MIN: u8 = 1;
pub const AGE_MAX: u8 = 150;
pub const PHONE_NUMBER_MAX_CHARS: usize = 20;
pub const ADDRESS_MAX_CHARS: usize = 200;

/// Minimum age of the "adults" projection.
pub const ADULT_AGE: u8 = 18;

/// Persisted user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Globally unique across live rows.
    pub email: String,
    pub age: u8,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    /// Set once on insert.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every replace; equal to `created_at` right after insert.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the mutable part of this record.
    pub fn fields(&self) -> UserFields {
        UserFields {
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age,
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
        }
    }

    /// Part of the email after the first `@`, if any.
    pub fn email_domain(&self) -> Option<&str> {
        self.email.split_once('@').map(|(_, domain)| domain)
    }

    /// One-line human-readable description.
    pub fn summary(&self) -> String {
        format!(
            "ID: {}, Name: {}, Age: {}, Email: {}",
            self.id, self.name, self.age, self.email
        )
    }

    /// Re-checks field bounds and timestamp ordering of a loaded row.
    pub fn validate(&self) -> Result<(), UserValidationErrors> {
        let violations = collect_violations(
            Some(self.name.as_str()),
            Some(self.email.as_str()),
            Some(i64::from(self.age)),
            self.phone_number.as_deref(),
            self.address.as_deref(),
        );
        if violations.is_empty() && self.updated_at < self.created_at {
            return Err(UserValidationErrors::new(vec![
                UserValidationError::TimestampsOutOfOrder,
            ]));
        }
        UserValidationErrors::check(violations)
    }
}

/// Caller-supplied user data before validation.
///
/// Every field is optional so that missing required values are reported as
/// validation failures rather than deserialization failures. Unknown keys
/// such as `id` or `createdAt` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Wider than `u8` so out-of-range input reaches validation.
    pub age: Option<i64>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl UserDraft {
    /// Creates a draft with the three required fields set.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            age: Some(age),
            phone_number: None,
            address: None,
        }
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Returns every violated rule, in field order. Empty means valid.
    pub fn validate(&self) -> Vec<UserValidationError> {
        collect_violations(
            self.name.as_deref(),
            self.email.as_deref(),
            self.age,
            self.phone_number.as_deref(),
            self.address.as_deref(),
        )
    }

    /// Validates and converts into persistable fields.
    ///
    /// # Errors
    /// - Returns all violations at once when any rule fails.
    pub fn into_fields(self) -> Result<UserFields, UserValidationErrors> {
        let violations = self.validate();
        let age = self.age.and_then(|age| u8::try_from(age).ok());
        match (self.name, self.email, age) {
            (Some(name), Some(email), Some(age)) if violations.is_empty() => Ok(UserFields {
                name,
                email,
                age,
                phone_number: self.phone_number,
                address: self.address,
            }),
            _ => Err(UserValidationErrors::new(violations)),
        }
    }
}

/// Mutable user attributes accepted by repository writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl UserFields {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: u8) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
            phone_number: None,
            address: None,
        }
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Checks field bounds; fields are public, so writes re-check them.
    pub fn validate(&self) -> Result<(), UserValidationErrors> {
        UserValidationErrors::check(collect_violations(
            Some(self.name.as_str()),
            Some(self.email.as_str()),
            Some(i64::from(self.age)),
            self.phone_number.as_deref(),
            self.address.as_deref(),
        ))
    }
}

/// A single violated field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    NameRequired,
    NameLength { chars: usize },
    EmailRequired,
    EmailFormat,
    EmailTooLong { chars: usize },
    AgeRequired,
    AgeOutOfRange { age: i64 },
    PhoneNumberTooLong { chars: usize },
    AddressTooLong { chars: usize },
    /// SQLite truncates text at NUL in `length()` and friends.
    ContainsNul { field: &'static str },
    /// Only reachable from persisted rows.
    TimestampsOutOfOrder,
}

impl UserValidationError {
    /// JSON field name the rule applies to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameRequired | Self::NameLength { .. } => "name",
            Self::EmailRequired | Self::EmailFormat | Self::EmailTooLong { .. } => "email",
            Self::AgeRequired | Self::AgeOutOfRange { .. } => "age",
            Self::PhoneNumberTooLong { .. } => "phoneNumber",
            Self::AddressTooLong { .. } => "address",
            Self::ContainsNul { field } => *field,
            Self::TimestampsOutOfOrder => "updatedAt",
        }
    }
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameRequired => write!(f, "Name is required."),
            Self::NameLength { .. } => write!(
                f,
                "Name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters."
            ),
            Self::EmailRequired => write!(f, "Email is required."),
            Self::EmailFormat => write!(f, "Email must contain '@'."),
            Self::EmailTooLong { .. } => {
                write!(f, "Email must be at most {EMAIL_MAX_CHARS} characters.")
            }
            Self::AgeRequired => write!(f, "Age is required."),
            Self::AgeOutOfRange { .. } => {
                write!(f, "Age must be between {AGE_MIN} and {AGE_MAX}.")
            }
            Self::PhoneNumberTooLong { .. } => write!(
                f,
                "Phone number must be at most {PHONE_NUMBER_MAX_CHARS} characters."
            ),
            Self::AddressTooLong { .. } => {
                write!(f, "Address must be at most {ADDRESS_MAX_CHARS} characters.")
            }
            Self::ContainsNul { field } => {
                write!(f, "Field '{field}' must not contain NUL characters.")
            }
            Self::TimestampsOutOfOrder => write!(f, "Updated time precedes created time."),
        }
    }
}

impl Error for UserValidationError {}

/// Non-empty set of violations for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserValidationErrors(Vec<UserValidationError>);

impl UserValidationErrors {
    pub fn new(violations: Vec<UserValidationError>) -> Self {
        Self(violations)
    }

    fn check(violations: Vec<UserValidationError>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self(violations))
        }
    }

    pub fn violations(&self) -> &[UserValidationError] {
        &self.0
    }
}

impl Display for UserValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for violation in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{violation}")?;
            first = false;
        }
        Ok(())
    }
}

impl Error for UserValidationErrors {}

fn collect_violations(
    name: Option<&str>,
    email: Option<&str>,
    age: Option<i64>,
    phone_number: Option<&str>,
    address: Option<&str>,
) -> Vec<UserValidationError> {
    let mut violations = Vec::new();

    match name {
        None => violations.push(UserValidationError::NameRequired),
        Some(value) if value.trim().is_empty() => {
            violations.push(UserValidationError::NameRequired)
        }
        Some(value) => {
            let chars = value.chars().count();
            if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
                violations.push(UserValidationError::NameLength { chars });
            }
            check_nul(&mut violations, "name", value);
        }
    }

    match email {
        None => violations.push(UserValidationError::EmailRequired),
        Some(value) if value.trim().is_empty() => {
            violations.push(UserValidationError::EmailRequired)
        }
        Some(value) => {
            if !value.contains('@') {
                violations.push(UserValidationError::EmailFormat);
            }
            let chars = value.chars().count();
            if chars > EMAIL_MAX_CHARS {
                violations.push(UserValidationError::EmailTooLong { chars });
            }
            check_nul(&mut violations, "email", value);
        }
    }

    match age {
        None => violations.push(UserValidationError::AgeRequired),
        Some(value) if !(i64::from(AGE_MIN)..=i64::from(AGE_MAX)).contains(&value) => {
            violations.push(UserValidationError::AgeOutOfRange { age: value })
        }
        Some(_) => {}
    }

    if let Some(value) = phone_number {
        let chars = value.chars().count();
        if chars > PHONE_NUMBER_MAX_CHARS {
            violations.push(UserValidationError::PhoneNumberTooLong { chars });
        }
        check_nul(&mut violations, "phoneNumber", value);
    }

    if let Some(value) = address {
        let chars = value.chars().count();
        if chars > ADDRESS_MAX_CHARS {
            violations.push(UserValidationError::AddressTooLong { chars });
        }
        check_nul(&mut violations, "address", value);
    }

    violations
}

fn check_nul(violations: &mut Vec<UserValidationError>, field: &'static str, value: &str) {
    if value.contains('\0') {
        violations.push(UserValidationError::ContainsNul { field });
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserDraft, UserValidationError};
    use chrono::DateTime;

    #[test]
    fn blank_name_counts_as_missing() {
        let draft = UserDraft::new("   ", "kim@test.com", 30);
        assert_eq!(draft.validate(), vec![UserValidationError::NameRequired]);
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let draft = UserDraft::new("김철", "kim@test.com", 30);
        assert!(draft.validate().is_empty());
    }

    #[test]
    fn nul_characters_are_rejected_per_field() {
        let draft = UserDraft::new("a\0bc", "kim@test.com", 30).with_address("Seoul\0");
        assert_eq!(
            draft.validate(),
            vec![
                UserValidationError::ContainsNul { field: "name" },
                UserValidationError::ContainsNul { field: "address" },
            ]
        );
        assert_eq!(
            draft.validate()[0].to_string(),
            "Field 'name' must not contain NUL characters."
        );
    }

    #[test]
    fn into_fields_keeps_optional_fields() {
        let fields = UserDraft::new("Kim", "kim@test.com", 25)
            .with_phone_number("010-1234-5678")
            .into_fields()
            .unwrap();
        assert_eq!(fields.age, 25);
        assert_eq!(fields.phone_number.as_deref(), Some("010-1234-5678"));
        assert_eq!(fields.address, None);
    }

    #[test]
    fn draft_deserializes_camel_case_and_ignores_server_fields() {
        let draft: UserDraft = serde_json::from_str(
            r#"{"id":9,"name":"Kim","email":"kim@test.com","age":25,"phoneNumber":"010","createdAt":"x"}"#,
        )
        .unwrap();
        assert_eq!(draft, UserDraft::new("Kim", "kim@test.com", 25).with_phone_number("010"));
    }

    #[test]
    fn user_serializes_camel_case_with_rfc3339_timestamps() {
        let at = DateTime::from_timestamp_millis(0).unwrap();
        let user = User {
            id: 1,
            name: "Kim".into(),
            email: "kim@test.com".into(),
            age: 25,
            phone_number: None,
            address: Some("Seoul".into()),
            created_at: at,
            updated_at: at,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["phoneNumber"], serde_json::Value::Null);
        assert_eq!(value["address"], "Seoul");
        assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
        assert_eq!(user.email_domain(), Some("test.com"));
    }
}
