//! Core domain logic for the Roster user service.
//! This crate is the single source of truth for user invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::stats::{AgeBracket, AgeStatistics, DomainStatistics};
pub use model::user::{
    User, UserDraft, UserFields, UserId, UserValidationError, UserValidationErrors,
};
pub use repo::user_query::{UserFilter, UserOrder, UserQuery};
pub use repo::user_repo::{RepoError, RepoResult, SqliteUserRepository, UserRepository};
pub use seed::{seed_sample_users, SeedFailure, SeedReport};
pub use service::user_service::{
    ServiceResult, UserService, UserServiceError, DEFAULT_RECENT_DAYS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
