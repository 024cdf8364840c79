//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the user data access contract and its finder specifications.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce `UserFields::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateEmail`) in
//!   addition to DB transport errors.

pub mod user_query;
pub mod user_repo;
