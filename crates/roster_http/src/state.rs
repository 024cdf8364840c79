//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and reach the store only through
//! `AppState::call`, which runs the use-case on actix's blocking pool.

use crate::error::{Action, ApiError, ApiResult};
use actix_web::web;
use roster_core::{ServiceResult, SqliteUserRepository, UserService};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// Single SQLite connection shared by all workers.
///
/// The mutex serializes every use-case, so check-then-write sequences in the
/// service never interleave across requests.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` against a service bound to the shared connection.
    ///
    /// Blocks the calling thread while the connection is held.
    pub fn with_service<T>(
        &self,
        op: impl FnOnce(&UserService<SqliteUserRepository<'_>>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let conn = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        let repo = SqliteUserRepository::try_new(&conn)?;
        op(&UserService::new(repo))
    }

    pub(crate) async fn call<T, F>(&self, action: Action, op: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&UserService<SqliteUserRepository<'_>>) -> ServiceResult<T> + Send + 'static,
    {
        let state = self.clone();
        match web::block(move || state.with_service(op)).await {
            Ok(result) => result.map_err(|err| ApiError::service(action, err)),
            Err(err) => Err(ApiError::internal(err)),
        }
    }
}
