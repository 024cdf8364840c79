//! HTTP adapter mapping for user-service errors.
//!
//! # Responsibility
//! - Turn service failures into status codes and `{error, message}` bodies.
//! - Keep store internals out of client responses.
//!
//! # Invariants
//! - 5xx bodies are always redacted; details only reach the log.
//! - Missing resources on the read path produce an empty 404.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use roster_core::UserServiceError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_ERROR: &str = "Internal server error";

/// JSON error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short headline, e.g. `User creation failed`.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
}

/// Use-case a handler was running; selects the failure headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    fn failure_headline(self) -> &'static str {
        match self {
            Self::Read => "User lookup failed",
            Self::Create => "User creation failed",
            Self::Update => "User update failed",
            Self::Delete => "User deletion failed",
        }
    }

    fn code(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    body: Option<ErrorBody>,
}

impl ApiError {
    fn with_body(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(ErrorBody {
                error: error.into(),
                message: message.into(),
            }),
        }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: None,
        }
    }

    /// 400 for malformed or invalid input.
    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_body(StatusCode::BAD_REQUEST, error, message)
    }

    /// 500 with a redacted body; `cause` is logged only.
    pub fn internal(cause: impl Display) -> Self {
        error!("event=http_request module=http status=error error_code=internal error={cause}");
        Self::with_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR, INTERNAL_ERROR)
    }

    /// Maps a service failure raised while running `action`.
    pub fn service(action: Action, err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(errors) => {
                Self::bad_request("Validation failed", errors.to_string())
            }
            UserServiceError::DuplicateEmail(email) => Self::bad_request(
                action.failure_headline(),
                format!("Email already exists: {email}"),
            ),
            UserServiceError::NotFound(id) => Self::with_body(
                StatusCode::NOT_FOUND,
                "User not found",
                format!("No user exists with id {id}."),
            ),
            UserServiceError::Repo(err) => {
                error!(
                    "event=http_request module=http status=error action={} error_code=repo_failure",
                    action.code()
                );
                Self::internal(err)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        self.body.as_ref()
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{}: {}", body.error, body.message),
            None => write!(f, "{}", self.status),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        match &self.body {
            Some(body) => builder.json(body),
            None => builder.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, ApiError};
    use actix_web::http::StatusCode;
    use roster_core::{RepoError, UserServiceError, UserValidationError, UserValidationErrors};

    #[test]
    fn validation_maps_to_bad_request_with_joined_messages() {
        let err = ApiError::service(
            Action::Create,
            UserServiceError::Validation(UserValidationErrors::new(vec![
                UserValidationError::NameRequired,
                UserValidationError::EmailFormat,
            ])),
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.body().unwrap();
        assert_eq!(body.error, "Validation failed");
        assert_eq!(body.message, "Name is required. Email must contain '@'.");
    }

    #[test]
    fn duplicate_email_headline_follows_action() {
        let created = ApiError::service(
            Action::Create,
            UserServiceError::DuplicateEmail("kim@test.com".into()),
        );
        let updated = ApiError::service(
            Action::Update,
            UserServiceError::DuplicateEmail("kim@test.com".into()),
        );

        assert_eq!(created.body().unwrap().error, "User creation failed");
        assert_eq!(updated.body().unwrap().error, "User update failed");
        assert!(created.body().unwrap().message.contains("kim@test.com"));
    }

    #[test]
    fn repo_failure_is_redacted() {
        let err = ApiError::service(
            Action::Read,
            UserServiceError::Repo(RepoError::InvalidData("secret column detail".into())),
        );

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.body().unwrap().message.contains("secret"));
    }

    #[test]
    fn not_found_on_read_has_no_body() {
        let err = ApiError::not_found();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.body().is_none());
    }
}
