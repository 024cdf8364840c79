//! HTTP adapter for the Roster user service.
//!
//! # Responsibility
//! - Mount the `/api/users` routes on an actix-web app.
//! - Translate extractor failures into the shared `{error, message}` body.
//!
//! # Invariants
//! - Handlers hold no state besides `AppState`.

pub mod error;
pub mod state;
pub mod users;

use actix_web::web;
pub use error::{Action, ApiError, ApiResult, ErrorBody};
pub use state::AppState;

/// Base path of every user route.
pub const USERS_SCOPE: &str = "/api/users";

/// Returns an app configurator that registers state, extractor error
/// handlers and the user routes.
///
/// ```no_run
/// use actix_web::{App, HttpServer};
/// use roster_core::db::open_db_in_memory;
/// use roster_http::{configure, AppState};
///
/// # async fn run() -> std::io::Result<()> {
/// let state = AppState::new(open_db_in_memory().expect("db"));
/// HttpServer::new(move || App::new().configure(configure(state.clone())))
///     .bind(("127.0.0.1", 8080))?
///     .run()
///     .await
/// # }
/// ```
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::bad_request("Invalid request body", err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                ApiError::bad_request("Invalid query parameter", err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                ApiError::bad_request("Invalid path parameter", err.to_string()).into()
            }))
            .service(
                web::scope(USERS_SCOPE)
                    .service(users::list_users)
                    .service(users::create_user)
                    .service(users::get_user_by_email)
                    .service(users::search_by_name)
                    .service(users::search_by_name_ignore_case)
                    .service(users::search_by_age_range)
                    .service(users::adults)
                    .service(users::by_min_age)
                    .service(users::by_email_domain)
                    .service(users::with_phone_number)
                    .service(users::sorted_by_age)
                    .service(users::sorted_by_name_desc)
                    .service(users::age_statistics)
                    .service(users::domain_statistics)
                    .service(users::recent_users)
                    .service(users::total_count)
                    .service(users::count_by_name)
                    .service(users::email_exists)
                    .service(users::get_user)
                    .service(users::update_user)
                    .service(users::delete_user)
                    .service(users::user_summary),
            );
    }
}
