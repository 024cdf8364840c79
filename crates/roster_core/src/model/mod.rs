//! Domain model for user records and derived statistics.
//!
//! # Responsibility
//! - Define the canonical `User` record and its inbound/validated shapes.
//! - Define read-only statistics projections over the user table.
//!
//! # Invariants
//! - Every persisted user is identified by a store-assigned `UserId`.
//! - Field bounds live here and nowhere else.

pub mod stats;
pub mod user;
